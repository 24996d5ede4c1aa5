use crate::error::BridgeError;
use crate::host::HostRef;

use super::app::AppCtx;
use super::queue::Dispatcher;

/// Result of running a [`Callback`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Delivery {
    /// The host target was alive and received the payload.
    Delivered,
    /// The host target was gone; nothing happened.
    AbsentTarget,
}

/// A result bound for a host target that may no longer exist.
///
/// Every boundary-crossing notification (text ready, object loaded, collision)
/// goes through this type. The target is resolved when the callback runs, not
/// when it is created, so a host object destroyed in between simply never
/// hears about it.
///
/// ```ignore
/// Callback::new("text.created", listener, handle, |l, h| {
///     l.text_created(h)
/// })
/// .dispatch(bridge.app())?;
/// ```
pub struct Callback<T: ?Sized, P, D> {
    label: &'static str,
    target: HostRef<T>,
    payload: P,
    deliver: D,
}

impl<T, P, D> Callback<T, P, D>
where
    T: ?Sized,
    D: FnOnce(&T, P),
{
    pub fn new(label: &'static str, target: HostRef<T>, payload: P, deliver: D) -> Self {
        Self {
            label,
            target,
            payload,
            deliver,
        }
    }

    /// Resolves the target and delivers the payload if it is still there.
    ///
    /// The strong reference taken for the call is dropped before returning.
    pub fn run(self) -> Delivery {
        let Some(target) = self.target.resolve() else {
            log::trace!("`{}` not delivered: host target is gone", self.label);
            return Delivery::AbsentTarget;
        };

        (self.deliver)(&*target, self.payload);
        Delivery::Delivered
    }
}

impl<T, P, D> Callback<T, P, D>
where
    T: ?Sized + Send + Sync + 'static,
    P: Send + 'static,
    D: FnOnce(&T, P) + Send + 'static,
{
    /// Queues the callback for delivery on the host thread.
    pub fn dispatch(self, app: &Dispatcher<AppCtx>) -> Result<(), BridgeError> {
        let label = self.label;
        app.submit(label, move |_ctx| {
            self.run();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::dispatch::{channel, AppQueue, QueueKind};

    trait Listener: Send + Sync {
        fn notify(&self, value: u32);
    }

    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
        last: AtomicUsize,
    }

    impl Listener for Recorder {
        fn notify(&self, value: u32) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last.store(value as usize, Ordering::SeqCst);
        }
    }

    fn app_queue() -> (Dispatcher<AppCtx>, AppQueue) {
        let (tx, rx) = channel(QueueKind::Application);
        (tx, AppQueue::new(rx))
    }

    #[test]
    fn delivers_to_a_live_target() {
        let recorder = Arc::new(Recorder::default());
        let target: Arc<dyn Listener> = recorder.clone();

        let outcome = Callback::new("test", HostRef::new(&target), 9, |l, v| {
            l.notify(v)
        })
        .run();

        assert_eq!(outcome, Delivery::Delivered);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn dropped_target_never_sees_the_callback() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let target: Arc<dyn Listener> = Arc::new(Recorder::default());
        let weak = HostRef::new(&target);
        drop(target);

        let (tx, mut queue) = app_queue();
        let seen = Arc::clone(&invoked);
        Callback::new("test", weak, 1, move |l, v| {
            seen.fetch_add(1, Ordering::SeqCst);
            l.notify(v);
        })
        .dispatch(&tx)
        .unwrap();

        let report = queue.drain_pending().unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn validity_is_checked_at_run_time_not_submit_time() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let target: Arc<dyn Listener> = Arc::new(Recorder::default());
        let (tx, mut queue) = app_queue();

        let seen = Arc::clone(&invoked);
        Callback::new("test", HostRef::new(&target), 1, move |l, v| {
            seen.fetch_add(1, Ordering::SeqCst);
            l.notify(v);
        })
        .dispatch(&tx)
        .unwrap();

        // Alive at submission, gone by the time the host drains.
        drop(target);

        assert_eq!(queue.drain_pending().unwrap().executed, 1);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn temporary_strong_reference_is_released_after_delivery() {
        let target: Arc<dyn Listener> = Arc::new(Recorder::default());
        let outcome = Callback::new("test", HostRef::new(&target), 0, |l, v| {
            l.notify(v)
        })
        .run();

        assert_eq!(outcome, Delivery::Delivered);
        assert_eq!(Arc::strong_count(&target), 1);
    }
}
