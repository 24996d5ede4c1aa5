use crate::paint::Color;

/// Horizontal placement of each line inside the text box.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of the line block inside the text box.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Where lines may be broken when they exceed the box width.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum LineBreakMode {
    /// Only explicit newlines break.
    #[default]
    None,
    WordWrap,
    CharWrap,
    /// Word wrap, with every line but the last of a paragraph stretched to the
    /// box width.
    Justify,
}

/// Whether lines falling below the box are dropped.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ClipMode {
    #[default]
    None,
    ClipToBounds,
}

// Hosts send these as names. Matching is case-insensitive and anything
// unrecognised falls back to the default.

impl HorizontalAlignment {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("right") {
            Self::Right
        } else if name.eq_ignore_ascii_case("center") {
            Self::Center
        } else {
            Self::Left
        }
    }
}

impl VerticalAlignment {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("bottom") {
            Self::Bottom
        } else if name.eq_ignore_ascii_case("center") {
            Self::Center
        } else {
            Self::Top
        }
    }
}

impl LineBreakMode {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("wordwrap") {
            Self::WordWrap
        } else if name.eq_ignore_ascii_case("charwrap") {
            Self::CharWrap
        } else if name.eq_ignore_ascii_case("justify") {
            Self::Justify
        } else {
            Self::None
        }
    }
}

impl ClipMode {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("cliptobounds") {
            Self::ClipToBounds
        } else {
            Self::None
        }
    }
}

/// Font selection. Rasterization is the renderer's business; the bridge only
/// needs the family name and pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct Typeface {
    pub family: String,
    pub size: u32,
}

impl Typeface {
    pub fn new(family: impl Into<String>, size: u32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for Typeface {
    fn default() -> Self {
        Self::new("sans-serif", 16)
    }
}

/// Every host-settable property of a text object.
///
/// `width`/`height` of `0.0` mean "unbounded". `max_lines` of `0` means
/// "no limit".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextProps {
    pub text: String,
    pub typeface: Typeface,
    pub color: Color,
    pub width: f32,
    pub height: f32,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub line_break: LineBreakMode,
    pub clip: ClipMode,
    pub max_lines: u32,
}

impl TextProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_typeface(mut self, typeface: Typeface) -> Self {
        self.typeface = typeface;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_bounds(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_alignment(mut self, horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn with_line_break(mut self, mode: LineBreakMode) -> Self {
        self.line_break = mode;
        self
    }

    pub fn with_clip(mut self, clip: ClipMode) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_max_lines(mut self, max_lines: u32) -> Self {
        self.max_lines = max_lines;
        self
    }
}
