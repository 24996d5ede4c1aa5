//! Colors as the host sends them.

mod color;

pub use color::Color;
