//! Dispatch queues.
//!
//! Two single-consumer queues move work between threads:
//! - the render queue, drained only by the render thread, is the only legal
//!   path for mutating render-owned state
//! - the application queue, drained only by the host, delivers results back
//!
//! Both are unbounded multi-producer channels, so `submit` never blocks. Units
//! from one producer run in submission order; nothing is promised across
//! producers or across the two queues.

mod app;
mod callback;
mod queue;
mod render;

use std::cell::Cell;
use std::fmt;

pub use app::{AppCtx, AppQueue};
pub use callback::{Callback, Delivery};
pub use queue::{channel, Dispatcher, DrainQueue, DrainReport, Unit};
pub use render::{FrameHook, RenderCtx, RenderThread};

/// Identifies one of the two queues.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum QueueKind {
    Render,
    Application,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Render => f.write_str("render"),
            QueueKind::Application => f.write_str("application"),
        }
    }
}

thread_local! {
    static THREAD_ROLE: Cell<Option<QueueKind>> = const { Cell::new(None) };
}

/// Marks the calling thread as the consumer of `kind` for its whole lifetime.
pub(crate) fn claim_thread(kind: QueueKind) {
    THREAD_ROLE.with(|role| role.set(Some(kind)));
}

/// Returns the queue this thread consumes, if it is a bridge thread.
pub fn thread_role() -> Option<QueueKind> {
    THREAD_ROLE.with(Cell::get)
}

/// Returns `true` on the render thread.
pub fn is_render_thread() -> bool {
    thread_role() == Some(QueueKind::Render)
}
