use thiserror::Error;

use crate::dispatch::QueueKind;
use crate::handle::Handle;

/// Errors surfaced synchronously to the caller of a bridge operation.
///
/// A host target that vanished before its callback ran is not an error; see
/// [`Delivery::AbsentTarget`](crate::dispatch::Delivery::AbsentTarget).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The handle was never issued by this registry or has already been released.
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    /// The handle is live but refers to an object of another type.
    #[error("handle {handle} refers to `{actual}`, not `{expected}`")]
    TypeMismatch {
        handle: Handle,
        expected: &'static str,
        actual: &'static str,
    },

    /// The queue's consumer has shut down and will never run new work.
    #[error("{0} queue is no longer accepting work")]
    QueueUnavailable(QueueKind),

    /// The queue was drained from a thread that must never consume it.
    #[error("{queue} queue cannot be drained from thread `{thread}`")]
    WrongThread { queue: QueueKind, thread: String },
}
