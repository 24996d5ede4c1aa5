use parking_lot::Mutex;
use tether_core::dispatch::RenderCtx;

use crate::paint::Color;

use super::layout::{layout, TextLayout};
use super::props::{
    ClipMode, HorizontalAlignment, LineBreakMode, TextProps, Typeface, VerticalAlignment,
};

struct TextState {
    props: TextProps,
    layout: TextLayout,
    /// Layout passes run so far. Zero until the first `update`.
    revision: u64,
}

/// A render-owned text object.
///
/// Mutation requires a [`RenderCtx`], so it only happens inside render units.
/// Every setter relayouts immediately.
pub struct Text {
    state: Mutex<TextState>,
}

impl Text {
    /// Creates the object without laying it out; the first [`Text::update`]
    /// does that on the render thread.
    pub fn new(props: TextProps) -> Self {
        Self {
            state: Mutex::new(TextState {
                props,
                layout: TextLayout::default(),
                revision: 0,
            }),
        }
    }

    pub fn props(&self) -> TextProps {
        self.state.lock().props.clone()
    }

    pub fn layout(&self) -> TextLayout {
        self.state.lock().layout.clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    /// Recomputes the glyph layout from the current properties.
    pub fn update(&self, _ctx: &RenderCtx) {
        let mut state = self.state.lock();
        state.layout = layout(&state.props);
        state.revision += 1;
    }

    fn modify(&self, ctx: &RenderCtx, f: impl FnOnce(&mut TextProps)) {
        f(&mut self.state.lock().props);
        self.update(ctx);
    }

    pub fn set_text(&self, ctx: &RenderCtx, text: String) {
        self.modify(ctx, |p| p.text = text);
    }

    pub fn set_typeface(&self, ctx: &RenderCtx, typeface: Typeface) {
        self.modify(ctx, |p| p.typeface = typeface);
    }

    pub fn set_color(&self, ctx: &RenderCtx, color: Color) {
        self.modify(ctx, |p| p.color = color);
    }

    pub fn set_width(&self, ctx: &RenderCtx, width: f32) {
        self.modify(ctx, |p| p.width = width);
    }

    pub fn set_height(&self, ctx: &RenderCtx, height: f32) {
        self.modify(ctx, |p| p.height = height);
    }

    pub fn set_horizontal_alignment(&self, ctx: &RenderCtx, alignment: HorizontalAlignment) {
        self.modify(ctx, |p| p.horizontal = alignment);
    }

    pub fn set_vertical_alignment(&self, ctx: &RenderCtx, alignment: VerticalAlignment) {
        self.modify(ctx, |p| p.vertical = alignment);
    }

    pub fn set_line_break_mode(&self, ctx: &RenderCtx, mode: LineBreakMode) {
        self.modify(ctx, |p| p.line_break = mode);
    }

    pub fn set_clip_mode(&self, ctx: &RenderCtx, clip: ClipMode) {
        self.modify(ctx, |p| p.clip = clip);
    }

    pub fn set_max_lines(&self, ctx: &RenderCtx, max_lines: u32) {
        self.modify(ctx, |p| p.max_lines = max_lines);
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Text")
            .field("text", &state.props.text)
            .field("lines", &state.layout.lines.len())
            .field("revision", &state.revision)
            .finish()
    }
}
