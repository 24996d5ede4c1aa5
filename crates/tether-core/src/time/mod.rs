//! Frame timing for the render loop.
//!
//! One `FrameClock` lives on the render thread; every drain pass ticks it once
//! and hands the resulting `FrameTime` to units through `RenderCtx`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
