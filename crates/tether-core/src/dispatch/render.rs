use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

use crate::config::RenderConfig;
use crate::time::{FrameClock, FrameTime};

use super::queue::{self, Dispatcher, DrainQueue};
use super::{claim_thread, QueueKind};

/// Context handed to every render unit.
///
/// Only the render loop can create one, and it cannot leave the render thread,
/// so APIs that take `&RenderCtx` can only be called from render units. That
/// is what makes the render queue the only path to render-owned state.
pub struct RenderCtx {
    frame: FrameTime,
    _thread_bound: PhantomData<*const ()>,
}

impl RenderCtx {
    fn new(frame: FrameTime) -> Self {
        Self {
            frame,
            _thread_bound: PhantomData,
        }
    }

    /// Timing of the current render pass.
    #[inline]
    pub fn frame(&self) -> FrameTime {
        self.frame
    }
}

/// The rendering pipeline, called once per pass after queued units ran.
pub trait FrameHook: Send + 'static {
    fn on_frame(&mut self, ctx: &RenderCtx);
}

impl<F> FrameHook for F
where
    F: FnMut(&RenderCtx) + Send + 'static,
{
    fn on_frame(&mut self, ctx: &RenderCtx) {
        self(ctx)
    }
}

/// Owns the render thread.
///
/// Dropping it performs the same orderly shutdown as [`RenderThread::shutdown`].
pub struct RenderThread {
    dispatcher: Dispatcher<RenderCtx>,
    join: Option<JoinHandle<()>>,
    name: String,
}

impl RenderThread {
    /// Spawns the render thread and returns its owner.
    pub fn spawn<H>(config: RenderConfig, hook: H) -> Result<Self>
    where
        H: FrameHook,
    {
        let (dispatcher, queue) = queue::channel(QueueKind::Render);
        let name = config.thread_name.clone();

        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || render_loop(config, queue, hook))
            .with_context(|| format!("failed to spawn render thread `{name}`"))?;

        log::debug!("render thread `{name}` spawned");

        Ok(Self {
            dispatcher,
            join: Some(join),
            name,
        })
    }

    /// Producer for the render queue.
    pub fn dispatcher(&self) -> Dispatcher<RenderCtx> {
        self.dispatcher.clone()
    }

    /// Runs every unit queued so far, then stops the thread and joins it.
    ///
    /// Submitting afterwards fails with `QueueUnavailable`.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        // An unavailable queue means the loop already exited on its own.
        if self.dispatcher.request_shutdown().is_err() {
            log::debug!("render thread `{}` was already stopped", self.name);
        }

        join.join()
            .map_err(|_| anyhow!("render thread `{}` panicked", self.name))?;

        log::debug!("render thread `{}` joined", self.name);
        Ok(())
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("render thread shutdown failed: {e:#}");
        }
    }
}

fn render_loop<H>(config: RenderConfig, mut queue: DrainQueue<RenderCtx>, mut hook: H)
where
    H: FrameHook,
{
    claim_thread(QueueKind::Render);
    let mut clock = FrameClock::new();

    loop {
        let mut ctx = RenderCtx::new(clock.tick());
        let report = queue.drain(&mut ctx, config.max_units_per_frame);

        // A broken pipeline must not take the queue down with it.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook.on_frame(&ctx))) {
            log::error!(
                "frame hook panicked on frame {}: {}",
                ctx.frame().frame_index,
                queue::panic_message(payload.as_ref())
            );
        }

        if report.closed {
            // Everything queued ahead of the stop marker still runs.
            let tail = queue.drain(&mut ctx, None);
            log::debug!(
                "render loop stopping after {} frame(s), {} trailing unit(s)",
                clock.frames(),
                tail.executed
            );
            break;
        }

        let deadline = config
            .frame_interval
            .map(|interval| ctx.frame().next_deadline(interval));

        if queue.has_pending() {
            // Budget exhausted: keep the frame pace instead of spinning.
            if let Some(deadline) = deadline {
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }
        } else {
            queue.wait_until(deadline);
        }
    }
}
