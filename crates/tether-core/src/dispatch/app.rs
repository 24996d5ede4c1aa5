use std::marker::PhantomData;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::BridgeError;

use super::queue::{DrainQueue, DrainReport};
use super::{thread_role, QueueKind};

/// Context handed to every application unit.
///
/// Created by [`AppQueue`] on the host thread for each drain pass.
pub struct AppCtx {
    pass: u64,
    _thread_bound: PhantomData<*const ()>,
}

impl AppCtx {
    /// Zero-based index of the drain pass running this unit.
    #[inline]
    pub fn pass(&self) -> u64 {
        self.pass
    }
}

/// Consumer side of the application queue, driven by the host.
///
/// The host calls [`drain_pending`](Self::drain_pending) from its own loop (UI
/// tick, message pump, test thread). The render thread is never allowed to
/// drain it: host callbacks can take unbounded time and would stall frames.
pub struct AppQueue {
    queue: DrainQueue<AppCtx>,
    passes: u64,
}

impl AppQueue {
    pub(crate) fn new(queue: DrainQueue<AppCtx>) -> Self {
        Self { queue, passes: 0 }
    }

    /// Delivers everything queued so far.
    pub fn drain_pending(&mut self) -> Result<DrainReport, BridgeError> {
        self.check_thread()?;

        let mut ctx = AppCtx {
            pass: self.passes,
            _thread_bound: PhantomData,
        };
        self.passes += 1;

        Ok(self.queue.drain(&mut ctx, None))
    }

    /// Waits up to `timeout` for a delivery, then drains.
    pub fn wait_and_drain(&mut self, timeout: Duration) -> Result<DrainReport, BridgeError> {
        self.check_thread()?;
        self.queue.wait_until(Some(Instant::now() + timeout));
        self.drain_pending()
    }

    fn check_thread(&self) -> Result<(), BridgeError> {
        if thread_role() != Some(QueueKind::Render) {
            return Ok(());
        }

        let thread = thread::current().name().unwrap_or("<unnamed>").to_string();
        log::error!("application queue drained from render thread `{thread}`");
        Err(BridgeError::WrongThread {
            queue: QueueKind::Application,
            thread,
        })
    }
}
