use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::BridgeError;

use super::QueueKind;

/// A unit of work: runs once on the consumer thread with the queue's context.
///
/// Errors returned from a unit (and panics inside it) are logged and counted;
/// they never stop the consumer.
pub type Unit<C> = Box<dyn FnOnce(&mut C) -> anyhow::Result<()> + Send + 'static>;

struct Task<C> {
    seq: u64,
    label: &'static str,
    unit: Unit<C>,
}

enum Envelope<C> {
    Run(Task<C>),
    Shutdown,
}

/// Producer side of a queue. Clone freely; every clone feeds the same consumer.
pub struct Dispatcher<C> {
    kind: QueueKind,
    tx: Sender<Envelope<C>>,
    seq: Arc<AtomicU64>,
}

/// Consumer side of a queue. Exactly one exists per queue.
pub struct DrainQueue<C> {
    kind: QueueKind,
    rx: Receiver<Envelope<C>>,
    // Oldest pending unit, pulled out of the channel while waiting.
    stashed: Option<Task<C>>,
    shutdown_requested: bool,
    disconnected: bool,
}

/// Outcome of one [`DrainQueue::drain`] pass.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrainReport {
    /// Units run in this pass, failed ones included.
    pub executed: usize,
    /// Units that returned an error or panicked.
    pub failed: usize,
    /// The queue was asked to stop or lost every producer.
    pub closed: bool,
}

/// Creates a connected producer/consumer pair.
pub fn channel<C>(kind: QueueKind) -> (Dispatcher<C>, DrainQueue<C>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        Dispatcher {
            kind,
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        },
        DrainQueue {
            kind,
            rx,
            stashed: None,
            shutdown_requested: false,
            disconnected: false,
        },
    )
}

impl<C> Dispatcher<C> {
    #[inline]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Enqueues `unit` and returns immediately.
    ///
    /// `label` names the unit in logs. Fails with `QueueUnavailable` once the
    /// consumer has gone away; the unit is dropped unrun in that case.
    pub fn submit<F>(&self, label: &'static str, unit: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&mut C) -> anyhow::Result<()> + Send + 'static,
    {
        // Sequence numbers are diagnostic; FIFO comes from the channel.
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let task = Task {
            seq,
            label,
            unit: Box::new(unit),
        };

        self.tx.send(Envelope::Run(task)).map_err(|_| {
            log::warn!("{} unit `{label}` dropped: consumer has shut down", self.kind);
            BridgeError::QueueUnavailable(self.kind)
        })
    }

    /// Asks the consumer to stop after the work already queued.
    pub(crate) fn request_shutdown(&self) -> Result<(), BridgeError> {
        self.tx
            .send(Envelope::Shutdown)
            .map_err(|_| BridgeError::QueueUnavailable(self.kind))
    }
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            tx: self.tx.clone(),
            seq: Arc::clone(&self.seq),
        }
    }
}

impl<C> DrainQueue<C> {
    #[inline]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// `true` once a stop marker arrived or every producer is gone.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shutdown_requested || self.disconnected
    }

    /// `true` if at least one unit is ready to run.
    pub fn has_pending(&self) -> bool {
        self.stashed.is_some() || !self.rx.is_empty()
    }

    /// Runs queued units without blocking, oldest first.
    ///
    /// `budget` caps the number of units run in this pass; `None` drains
    /// everything currently queued.
    pub fn drain(&mut self, ctx: &mut C, budget: Option<usize>) -> DrainReport {
        let limit = budget.unwrap_or(usize::MAX);
        let mut report = DrainReport::default();

        while report.executed < limit {
            let Some(task) = self.next_ready() else {
                break;
            };

            report.executed += 1;
            if !run_task(self.kind, task, ctx) {
                report.failed += 1;
            }
        }

        report.closed = self.is_closed();
        report
    }

    /// Blocks until work arrives, the queue closes, or `deadline` passes.
    ///
    /// `None` waits without a deadline.
    pub fn wait_until(&mut self, deadline: Option<Instant>) {
        if self.stashed.is_some() || self.is_closed() {
            return;
        }

        let received = match deadline {
            Some(deadline) => self.rx.recv_deadline(deadline),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Envelope::Run(task)) => self.stashed = Some(task),
            Ok(Envelope::Shutdown) => self.shutdown_requested = true,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.disconnected = true,
        }
    }

    fn next_ready(&mut self) -> Option<Task<C>> {
        if let Some(task) = self.stashed.take() {
            return Some(task);
        }

        loop {
            match self.rx.try_recv() {
                Ok(Envelope::Run(task)) => return Some(task),
                // Units queued behind the marker still run; the consumer stops
                // once the channel is empty.
                Ok(Envelope::Shutdown) => self.shutdown_requested = true,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    return None;
                }
            }
        }
    }
}

/// Runs one unit, containing its failure. Returns `true` on success.
fn run_task<C>(kind: QueueKind, task: Task<C>, ctx: &mut C) -> bool {
    let Task { seq, label, unit } = task;

    match panic::catch_unwind(AssertUnwindSafe(|| unit(ctx))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            log::error!("{kind} unit `{label}` (#{seq}) failed: {err:#}");
            false
        }
        Err(payload) => {
            log::error!(
                "{kind} unit `{label}` (#{seq}) panicked: {}",
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
