use std::mem;

use super::props::{ClipMode, HorizontalAlignment, LineBreakMode, TextProps, VerticalAlignment};

/// Horizontal advance of every glyph, as a fraction of the font size.
///
/// The real glyph metrics live in the renderer's rasterizer; line breaking
/// only needs a stable estimate.
pub const ADVANCE_EM: f32 = 0.5;

/// Distance between baselines, as a fraction of the font size.
pub const LINE_HEIGHT_EM: f32 = 1.2;

// Absorbs float error when checking whether a whole line fits the box.
const FIT_EPSILON: f32 = 1e-3;

/// One positioned line, in text-box coordinates (origin top-left, y down).
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// Result of laying out a text object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LaidLine>,
    pub line_height: f32,
    /// Lines were dropped by `max_lines` or clipping.
    pub truncated: bool,
}

impl TextLayout {
    pub fn line_texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

struct BrokenLine {
    text: String,
    chars: usize,
    ends_paragraph: bool,
}

/// Breaks and positions `props.text`.
pub fn layout(props: &TextProps) -> TextLayout {
    let size = props.typeface.size as f32;
    let advance = size * ADVANCE_EM;
    let line_height = size * LINE_HEIGHT_EM;

    let max_chars = if props.width > 0.0 && advance > 0.0 {
        ((props.width / advance).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut lines = Vec::new();
    for paragraph in props.text.split('\n') {
        let broken = match props.line_break {
            LineBreakMode::None => vec![paragraph.to_string()],
            LineBreakMode::CharWrap => break_chars(paragraph, max_chars),
            LineBreakMode::WordWrap | LineBreakMode::Justify => break_words(paragraph, max_chars),
        };

        let last = broken.len().saturating_sub(1);
        lines.extend(broken.into_iter().enumerate().map(|(i, text)| BrokenLine {
            chars: text.chars().count(),
            text,
            ends_paragraph: i == last,
        }));
    }

    let mut truncated = false;

    if props.max_lines > 0 && lines.len() > props.max_lines as usize {
        lines.truncate(props.max_lines as usize);
        truncated = true;
    }

    if props.clip == ClipMode::ClipToBounds && props.height > 0.0 && line_height > 0.0 {
        let fit = ((props.height + FIT_EPSILON) / line_height).floor() as usize;
        if lines.len() > fit {
            lines.truncate(fit);
            truncated = true;
        }
    }

    let natural = |line: &BrokenLine| line.chars as f32 * advance;

    let box_width = if props.width > 0.0 {
        props.width
    } else {
        lines.iter().map(natural).fold(0.0, f32::max)
    };
    let block_height = lines.len() as f32 * line_height;
    let box_height = if props.height > 0.0 { props.height } else { block_height };

    let top = match props.vertical {
        VerticalAlignment::Top => 0.0,
        VerticalAlignment::Center => (box_height - block_height) / 2.0,
        VerticalAlignment::Bottom => box_height - block_height,
    };

    let laid = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let justify = props.line_break == LineBreakMode::Justify
                && !line.ends_paragraph
                && line.chars > 0;

            let width = if justify { box_width } else { natural(line) };
            let x = if justify {
                0.0
            } else {
                match props.horizontal {
                    HorizontalAlignment::Left => 0.0,
                    HorizontalAlignment::Center => (box_width - width) / 2.0,
                    HorizontalAlignment::Right => box_width - width,
                }
            };

            LaidLine {
                text: line.text.clone(),
                x,
                y: top + i as f32 * line_height,
                width,
            }
        })
        .collect();

    TextLayout {
        lines: laid,
        line_height,
        truncated,
    }
}

fn break_chars(paragraph: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(max_chars).map(|c| c.iter().collect()).collect()
}

fn break_words(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
        let mut word: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len.saturating_add(1 + word.len()) <= max_chars {
            current.push(' ');
            current.extend(word.iter());
            current_len += 1 + word.len();
            continue;
        }

        if current_len > 0 {
            lines.push(mem::take(&mut current));
        }

        // A word wider than the box is split at the box edge.
        while word.len() > max_chars {
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        current = word.iter().collect();
        current_len = word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
