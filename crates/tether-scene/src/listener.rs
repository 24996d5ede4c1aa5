//! Host-side receivers for results produced on the render side.
//!
//! The bindings only ever hold these through `HostRef`, so a listener the host
//! dropped is never called.

use tether_core::handle::Handle;

use crate::node::{Collision, Geometry};

pub trait TextListener: Send + Sync {
    /// The text behind `handle` finished its first layout.
    fn text_created(&self, handle: Handle);
}

/// How an asynchronous object load ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

pub trait LoadListener: Send + Sync {
    fn object_loaded(&self, handle: Handle, outcome: LoadOutcome);
}

pub trait CollisionListener: Send + Sync {
    fn on_collided(&self, collision: &Collision);
}

/// Produces geometry from a source string (path, URL, inline data). Runs on a
/// loader thread, never on the render thread.
pub trait AssetLoader: Send + Sync {
    fn load(&self, source: &str) -> anyhow::Result<Geometry>;
}

impl<F> AssetLoader for F
where
    F: Fn(&str) -> anyhow::Result<Geometry> + Send + Sync,
{
    fn load(&self, source: &str) -> anyhow::Result<Geometry> {
        self(source)
    }
}
