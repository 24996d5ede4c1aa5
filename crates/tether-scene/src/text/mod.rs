mod layout;
mod object;
mod props;

pub use layout::{layout, LaidLine, TextLayout, ADVANCE_EM, LINE_HEIGHT_EM};
pub use object::Text;
pub use props::{ClipMode, HorizontalAlignment, LineBreakMode, TextProps, Typeface, VerticalAlignment};
