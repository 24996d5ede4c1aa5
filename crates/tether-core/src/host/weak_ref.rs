use std::fmt;
use std::sync::{Arc, Weak};

/// Non-owning reference to a host-side target.
///
/// Cheap to clone and safe to keep for any duration. Resolution happens at the
/// point of use: once the last strong owner on the host side is gone, every
/// later resolution reports absence, from any thread, forever.
pub struct HostRef<T: ?Sized> {
    target: Weak<T>,
}

impl<T: ?Sized> HostRef<T> {
    /// Creates a reference to `target` without taking a strong share.
    pub fn new(target: &Arc<T>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    /// Returns a temporary strong reference, or `None` if the target is gone.
    ///
    /// Drop the returned `Arc` as soon as the call it guards is finished;
    /// holding it keeps the host object alive.
    #[inline]
    pub fn resolve(&self) -> Option<Arc<T>> {
        self.target.upgrade()
    }

    /// Runs `f` against the target if it still exists.
    ///
    /// The strong reference taken for the call is released when `f` returns.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let target = self.target.upgrade()?;
        Some(f(&target))
    }

    /// Returns `true` while the host still owns the target.
    ///
    /// Only a hint: the answer may be stale by the time the caller acts on it.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl<T: ?Sized> Clone for HostRef<T> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
        }
    }
}

impl<T: ?Sized> From<&Arc<T>> for HostRef<T> {
    fn from(target: &Arc<T>) -> Self {
        Self::new(target)
    }
}

impl<T: ?Sized> fmt::Debug for HostRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
