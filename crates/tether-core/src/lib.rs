//! Tether core crate.
//!
//! This crate owns the pieces that let a host thread hand native objects to a
//! dedicated render thread without sharing lifetimes: opaque handles, weak host
//! references, the render and application dispatch queues, and the callback
//! adapter that ties them together.

pub mod dispatch;
pub mod handle;
pub mod host;
pub mod logging;
pub mod time;

mod bridge;
mod config;
mod error;
mod runtime;

pub use bridge::{Bridge, Capture};
pub use config::{RenderConfig, RuntimeConfig};
pub use error::BridgeError;
pub use runtime::Runtime;
