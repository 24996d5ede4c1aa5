//! Tether scene crate.
//!
//! Render-owned scene objects (nodes, text) and the host-facing bindings that
//! create, mutate and destroy them through `tether-core`. Every mutation of a
//! scene object takes a `&RenderCtx`, so it can only happen inside a render
//! unit; reads return snapshots and are safe from any thread.

pub mod coords;
pub mod listener;
pub mod node;
pub mod paint;
pub mod text;

mod bindings;

pub use bindings::SceneBindings;
