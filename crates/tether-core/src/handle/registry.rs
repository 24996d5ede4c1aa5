use std::any::{type_name, Any};
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::BridgeError;

use super::Handle;

struct Entry {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Table of live handles.
///
/// Each entry holds exactly one strong share of its object. The table is a
/// sharded concurrent map: `resolve` and `release` of one handle are mutually
/// exclusive, but unrelated handles only contend when they share a shard, and
/// never while an object's destructor runs.
///
/// Handles come from a monotonically increasing counter and are never reused
/// by the registry that issued them.
///
/// The registry is an ordinary value. [`Runtime`](crate::Runtime) creates one
/// and hands it to whoever needs to mint or resolve handles through
/// [`Bridge`](crate::Bridge).
pub struct HandleRegistry {
    entries: DashMap<Handle, Entry>,
    issued: AtomicU64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            issued: AtomicU64::new(0),
        }
    }

    /// Registers a shared object and returns a fresh handle for it.
    pub fn register<T>(&self, object: Arc<T>) -> Handle
    where
        T: Any + Send + Sync,
    {
        let previous = self.issued.fetch_add(1, Ordering::Relaxed);
        let handle = Handle::new(NonZeroU64::MIN.saturating_add(previous));

        self.entries.insert(
            handle,
            Entry {
                object,
                type_name: type_name::<T>(),
            },
        );

        log::trace!("registered {handle} ({})", type_name::<T>());
        handle
    }

    /// Wraps `value` in an `Arc` and registers it.
    pub fn register_value<T>(&self, value: T) -> Handle
    where
        T: Any + Send + Sync,
    {
        self.register(Arc::new(value))
    }

    /// Returns a strong reference to the object behind `handle`.
    ///
    /// Never blocks on render-thread state. Fails with `InvalidHandle` once the
    /// handle has been released, and with `TypeMismatch` if the entry holds
    /// another type.
    pub fn resolve<T>(&self, handle: Handle) -> Result<Arc<T>, BridgeError>
    where
        T: Any + Send + Sync,
    {
        // Clone under the shard read lock, downcast after it is gone.
        let (object, actual) = {
            let entry = self
                .entries
                .get(&handle)
                .ok_or(BridgeError::InvalidHandle(handle))?;
            (Arc::clone(&entry.object), entry.type_name)
        };

        object
            .downcast::<T>()
            .map_err(|_| BridgeError::TypeMismatch {
                handle,
                expected: type_name::<T>(),
                actual,
            })
    }

    /// Returns `true` while `handle` is registered.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Drops the registry's share of the object behind `handle`.
    ///
    /// Other strong references (queued units, scene links) keep the object
    /// alive until they are dropped too. Releasing twice is rejected with
    /// `InvalidHandle`.
    pub fn release(&self, handle: Handle) -> Result<(), BridgeError> {
        let Some((_, entry)) = self.entries.remove(&handle) else {
            log::warn!("release of unknown or already released handle {handle}");
            return Err(BridgeError::InvalidHandle(handle));
        };

        log::trace!("released {handle} ({})", entry.type_name);

        // `remove` has already unlocked the shard; the destructor may run here.
        drop(entry);
        Ok(())
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every remaining entry and returns how many there were.
    ///
    /// Called once at shutdown after both queues have stopped. Anything still
    /// registered at this point is a handle the host never released.
    pub fn teardown(&self) -> usize {
        let handles: Vec<Handle> = self.entries.iter().map(|e| *e.key()).collect();

        let mut released = 0;
        for handle in handles {
            if let Some((_, entry)) = self.entries.remove(&handle) {
                log::debug!("teardown released {handle} ({})", entry.type_name);
                released += 1;
            }
        }

        if released > 0 {
            log::warn!("registry teardown released {released} handle(s) the host never released");
        }

        released
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.entries.len())
            .field("issued", &self.issued.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        let live = self.entries.len();
        if live > 0 {
            log::debug!("registry dropped with {live} live handle(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Mesh(u32);

    // ── register / resolve ────────────────────────────────────────────────

    #[test]
    fn resolve_returns_the_registered_object() {
        let registry = HandleRegistry::new();
        let mesh = Arc::new(Mesh(7));
        let h = registry.register(Arc::clone(&mesh));

        let resolved = registry.resolve::<Mesh>(h).unwrap();
        assert!(Arc::ptr_eq(&resolved, &mesh));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_with_wrong_type_is_a_mismatch() {
        let registry = HandleRegistry::new();
        let h = registry.register_value(Mesh(1));

        match registry.resolve::<String>(h) {
            Err(BridgeError::TypeMismatch { handle, .. }) => assert_eq!(handle, h),
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
        // A mismatch does not disturb the entry.
        assert!(registry.resolve::<Mesh>(h).is_ok());
    }

    #[test]
    fn unknown_handle_is_invalid() {
        let registry = HandleRegistry::new();
        let h = Handle::from_raw(99).unwrap();
        assert_eq!(registry.resolve::<Mesh>(h), Err(BridgeError::InvalidHandle(h)));
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn released_handle_never_resolves_again() {
        let registry = HandleRegistry::new();
        let h = registry.register_value(Mesh(1));

        registry.release(h).unwrap();
        assert!(!registry.contains(h));
        assert_eq!(registry.resolve::<Mesh>(h), Err(BridgeError::InvalidHandle(h)));

        // New registrations never bring the old value back.
        for i in 0..16 {
            let other = registry.register_value(Mesh(i));
            assert_ne!(other, h);
        }
        assert!(registry.resolve::<Mesh>(h).is_err());
    }

    #[test]
    fn double_release_is_rejected() {
        let registry = HandleRegistry::new();
        let h = registry.register_value(Mesh(1));

        assert!(registry.release(h).is_ok());
        assert_eq!(registry.release(h), Err(BridgeError::InvalidHandle(h)));
    }

    #[test]
    fn release_only_drops_the_registry_share() {
        let registry = HandleRegistry::new();
        let mesh = Arc::new(Mesh(3));
        let h = registry.register(Arc::clone(&mesh));
        let captured = registry.resolve::<Mesh>(h).unwrap();

        registry.release(h).unwrap();
        drop(mesh);

        // The captured share is now the only owner and still valid.
        assert_eq!(Arc::strong_count(&captured), 1);
        assert_eq!(*captured, Mesh(3));
    }

    #[test]
    fn handles_are_unique_across_interleaved_register_release() {
        let registry = HandleRegistry::new();
        let mut seen = HashSet::new();
        for i in 0..256 {
            let h = registry.register_value(Mesh(i));
            assert!(seen.insert(h), "handle {h} issued twice");
            if i % 3 == 0 {
                registry.release(h).unwrap();
            }
        }
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn teardown_releases_everything_left() {
        let registry = HandleRegistry::new();
        let a = registry.register_value(Mesh(1));
        let _b = registry.register_value(Mesh(2));
        let _c = registry.register_value(Mesh(3));
        registry.release(a).unwrap();

        assert_eq!(registry.teardown(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.teardown(), 0);
    }

    // ── concurrency ───────────────────────────────────────────────────────

    /// Destructor that blocks until another thread has resolved a different
    /// handle. If `release` held a lock across the destructor, the resolver
    /// could not make progress and the gate would time out.
    struct BlockingDrop {
        gate: crossbeam_channel::Receiver<()>,
        opened: Arc<AtomicBool>,
    }

    impl Drop for BlockingDrop {
        fn drop(&mut self) {
            let ok = self.gate.recv_timeout(Duration::from_secs(5)).is_ok();
            self.opened.store(ok, Ordering::SeqCst);
        }
    }

    #[test]
    fn release_does_not_block_resolve_of_other_handles() {
        let registry = Arc::new(HandleRegistry::new());
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(1);
        let opened = Arc::new(AtomicBool::new(false));

        // Register many handles so some share the releasing handle's shard.
        let others: Vec<Handle> = (0..64).map(|i| registry.register_value(Mesh(i))).collect();
        let blocking = registry.register_value(BlockingDrop {
            gate: gate_rx,
            opened: Arc::clone(&opened),
        });

        let releaser = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.release(blocking))
        };

        let resolver = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for h in &others {
                    registry.resolve::<Mesh>(*h).unwrap();
                }
                gate_tx.send(()).unwrap();
            })
        };

        resolver.join().unwrap();
        releaser.join().unwrap().unwrap();
        assert!(opened.load(Ordering::SeqCst));
    }

    #[test]
    fn concurrent_resolvers_and_releasers_stay_consistent() {
        const THREADS: usize = 8;
        const PER_THREAD: u32 = 200;

        let registry = Arc::new(HandleRegistry::new());
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let value = t as u32 * PER_THREAD + i;
                        let h = registry.register_value(Mesh(value));
                        assert_eq!(*registry.resolve::<Mesh>(h).unwrap(), Mesh(value));
                        registry.release(h).unwrap();
                        assert!(registry.resolve::<Mesh>(h).is_err());
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
