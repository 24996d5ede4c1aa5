use std::sync::Arc;

use anyhow::{Context, Result};

use crate::bridge::Bridge;
use crate::config::RuntimeConfig;
use crate::dispatch::{self, AppQueue, FrameHook, QueueKind, RenderCtx, RenderThread};
use crate::handle::HandleRegistry;
use crate::logging::init_logging;

/// Owns the registry, both queues and the render thread.
///
/// Lives on the host thread: the host hands [`Bridge`] clones to its bindings
/// and drains [`AppQueue`] from its own loop.
pub struct Runtime {
    bridge: Bridge,
    render: RenderThread,
    app: AppQueue,
}

impl Runtime {
    /// Starts a runtime whose render passes only drain the queue.
    pub fn start(config: RuntimeConfig) -> Result<Self> {
        Self::start_with_hook(config, |_: &RenderCtx| {})
    }

    /// Starts a runtime that calls `hook` after each render pass.
    pub fn start_with_hook<H>(config: RuntimeConfig, hook: H) -> Result<Self>
    where
        H: FrameHook,
    {
        if let Some(logging) = config.logging {
            init_logging(logging);
        }

        let registry = Arc::new(HandleRegistry::new());
        let (app_tx, app_rx) = dispatch::channel(QueueKind::Application);
        let render = RenderThread::spawn(config.render, hook).context("failed to start runtime")?;
        let bridge = Bridge::new(registry, render.dispatcher(), app_tx);

        log::info!("runtime started");

        Ok(Self {
            bridge,
            render,
            app: AppQueue::new(app_rx),
        })
    }

    #[inline]
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    #[inline]
    pub fn app_queue(&mut self) -> &mut AppQueue {
        &mut self.app
    }

    /// Orderly teardown.
    ///
    /// 1. The render thread runs everything queued so far and exits.
    /// 2. Results it produced are delivered on the calling (host) thread.
    /// 3. Handles the host never released are dropped.
    ///
    /// Steps 2 and 3 run even when step 1 fails; the first error is returned
    /// afterwards. Otherwise returns the number of handles released by step 3.
    pub fn shutdown(self) -> Result<usize> {
        let Self {
            bridge,
            render,
            app,
        } = self;

        let stopped = render
            .shutdown()
            .context("render thread did not stop cleanly");
        finish_shutdown(stopped, app, bridge.registry())
    }
}

fn finish_shutdown(
    stopped: Result<()>,
    mut app: AppQueue,
    registry: &HandleRegistry,
) -> Result<usize> {
    if let Err(err) = &stopped {
        log::error!("{err:#}; delivering results and releasing handles anyway");
    }

    let delivered = app
        .drain_pending()
        .context("failed to deliver final results");
    let leaked = registry.teardown();

    log::info!(
        "runtime stopped ({} final deliveries, {leaked} leaked handle(s))",
        delivered.as_ref().map_or(0, |report| report.executed)
    );

    stopped?;
    delivered?;
    Ok(leaked)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::Duration;

    use crossbeam_channel::{bounded, unbounded};

    use crate::config::RenderConfig;
    use crate::dispatch::{is_render_thread, AppCtx, Callback};
    use crate::error::BridgeError;
    use crate::host::HostRef;
    use crate::Capture;

    const WAIT: Duration = Duration::from_secs(5);

    struct Node {
        touched: AtomicBool,
    }

    impl Node {
        fn new() -> Self {
            Self {
                touched: AtomicBool::new(false),
            }
        }
    }

    fn start() -> Runtime {
        Runtime::start(RuntimeConfig::default().with_render(
            RenderConfig::default().with_frame_interval(Some(Duration::from_millis(2))),
        ))
        .unwrap()
    }

    /// Blocks the render thread until the returned sender fires.
    fn hold_render_thread(bridge: &Bridge) -> crossbeam_channel::Sender<()> {
        let (tx, rx) = bounded::<()>(1);
        bridge
            .render()
            .submit("test.gate", move |_| {
                rx.recv_timeout(WAIT)?;
                Ok(())
            })
            .unwrap();
        tx
    }

    /// Returns once every unit submitted before it has run.
    fn flush(bridge: &Bridge) {
        let (tx, rx) = bounded::<()>(1);
        bridge
            .render()
            .submit("test.flush", move |_| {
                tx.send(())?;
                Ok(())
            })
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();
    }

    // ── lifetime across the hop ───────────────────────────────────────────

    #[test]
    fn retained_object_outlives_release_before_execution() {
        let runtime = start();
        let bridge = runtime.bridge().clone();

        let handle = bridge.registry().register_value(Node::new());
        let gate = hold_render_thread(&bridge);

        let (done_tx, done_rx) = bounded(1);
        bridge
            .on_render(handle, Capture::Retain, "test.touch", move |node: &Node, _| {
                node.touched.store(true, Ordering::SeqCst);
                done_tx.send(node.touched.load(Ordering::SeqCst))?;
                Ok(())
            })
            .unwrap();

        bridge.registry().release(handle).unwrap();
        gate.send(()).unwrap();

        assert!(done_rx.recv_timeout(WAIT).unwrap());
        assert_eq!(
            bridge.registry().resolve::<Node>(handle).err(),
            Some(BridgeError::InvalidHandle(handle))
        );
        runtime.shutdown().unwrap();
    }

    #[test]
    fn weak_capture_skips_destroyed_objects() {
        let runtime = start();
        let bridge = runtime.bridge().clone();

        let handle = bridge.registry().register_value(Node::new());
        let gate = hold_render_thread(&bridge);

        let ran = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&ran);
        bridge
            .on_render(handle, Capture::Weak, "test.touch", move |_: &Node, _| {
                seen.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        bridge.registry().release(handle).unwrap();
        gate.send(()).unwrap();
        flush(&bridge);

        assert!(!ran.load(Ordering::SeqCst));
        runtime.shutdown().unwrap();
    }

    #[test]
    fn on_render_reports_invalid_handles_synchronously() {
        let runtime = start();
        let bridge = runtime.bridge().clone();
        let handle = bridge.registry().register_value(Node::new());
        bridge.registry().release(handle).unwrap();

        let result = bridge.on_render(handle, Capture::Retain, "test", |_: &Node, _| Ok(()));
        assert_eq!(result, Err(BridgeError::InvalidHandle(handle)));
        runtime.shutdown().unwrap();
    }

    // ── ordering / thread confinement ─────────────────────────────────────

    #[test]
    fn render_units_run_in_order_on_the_render_thread() {
        let runtime = start();
        let bridge = runtime.bridge().clone();
        let (tx, rx) = unbounded();

        for stamp in 0..100u32 {
            let tx = tx.clone();
            bridge
                .render()
                .submit("test.stamp", move |_| {
                    tx.send((stamp, is_render_thread()))?;
                    Ok(())
                })
                .unwrap();
        }

        let received: Vec<(u32, bool)> = (0..100).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        assert_eq!(
            received.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            (0..100).collect::<Vec<_>>()
        );
        assert!(received.iter().all(|(_, on_render)| *on_render));
        assert!(!is_render_thread());
        runtime.shutdown().unwrap();
    }

    #[test]
    fn frame_index_advances_between_passes() {
        let frames = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&frames);
        let runtime = Runtime::start_with_hook(
            RuntimeConfig::default().with_render(
                RenderConfig::default().with_frame_interval(Some(Duration::from_millis(1))),
            ),
            move |ctx: &RenderCtx| counted.store(ctx.frame().frame_index, Ordering::SeqCst),
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(30));
        runtime.shutdown().unwrap();
        assert!(frames.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn application_queue_cannot_be_drained_by_the_render_thread() {
        let runtime = start();
        let bridge = runtime.bridge().clone();

        let (_app_tx, app_rx) = dispatch::channel::<AppCtx>(QueueKind::Application);
        let mut stray = AppQueue::new(app_rx);
        let (tx, rx) = bounded(1);
        bridge
            .render()
            .submit("test.wrong_thread", move |_| {
                tx.send(stray.drain_pending())?;
                Ok(())
            })
            .unwrap();

        match rx.recv_timeout(WAIT).unwrap() {
            Err(BridgeError::WrongThread { queue, .. }) => {
                assert_eq!(queue, QueueKind::Application)
            }
            other => panic!("expected WrongThread, got {other:?}"),
        }
        runtime.shutdown().unwrap();
    }

    // ── results back to the host ──────────────────────────────────────────

    #[test]
    fn render_results_reach_a_live_host_target_only() {
        let mut runtime = start();
        let bridge = runtime.bridge().clone();

        let alive: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let gone: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let alive_ref = HostRef::new(&alive);
        let gone_ref = HostRef::new(&gone);
        drop(gone);

        let notifier = bridge.clone();
        bridge
            .render()
            .submit("test.produce", move |_| {
                notifier.notify("test.alive", &alive_ref, 7, |t: &AtomicU64, v| {
                    t.store(v, Ordering::SeqCst)
                })?;
                notifier.notify("test.gone", &gone_ref, 9, |t: &AtomicU64, v| {
                    t.store(v, Ordering::SeqCst)
                })?;
                Ok(())
            })
            .unwrap();
        flush(&bridge);

        let report = runtime.app_queue().drain_pending().unwrap();
        assert_eq!(report.executed, 2);
        assert_eq!(alive.load(Ordering::SeqCst), 7);
        runtime.shutdown().unwrap();
    }

    // ── shutdown ──────────────────────────────────────────────────────────

    #[test]
    fn shutdown_runs_queued_work_then_rejects_submissions() {
        let runtime = start();
        let bridge = runtime.bridge().clone();
        let gate = hold_render_thread(&bridge);

        let ran = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&ran);
        bridge
            .render()
            .submit("test.queued", move |_| {
                seen.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        gate.send(()).unwrap();

        let leaked_handle = bridge.registry().register_value(Node::new());
        let leaked = runtime.shutdown().unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(leaked, 1);
        assert!(!bridge.registry().contains(leaked_handle));
        assert_eq!(
            bridge.render().submit("test.late", |_| Ok(())),
            Err(BridgeError::QueueUnavailable(QueueKind::Render))
        );
    }

    // ── failure paths ─────────────────────────────────────────────────────

    #[test]
    fn panicking_frame_hook_does_not_stop_the_render_thread() {
        let panicked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&panicked);
        let runtime = Runtime::start_with_hook(
            RuntimeConfig::default().with_render(
                RenderConfig::default().with_frame_interval(Some(Duration::from_millis(1))),
            ),
            move |_: &RenderCtx| {
                if !flag.swap(true, Ordering::SeqCst) {
                    panic!("pipeline exploded");
                }
            },
        )
        .unwrap();
        let bridge = runtime.bridge().clone();

        let deadline = std::time::Instant::now() + WAIT;
        while !panicked.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(panicked.load(Ordering::SeqCst));

        let (tx, rx) = bounded(1);
        bridge
            .render()
            .submit("test.after_panic", move |_| {
                tx.send(())?;
                Ok(())
            })
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();

        assert_eq!(runtime.shutdown().unwrap(), 0);
    }

    #[test]
    fn failed_render_stop_still_delivers_results_and_releases_handles() {
        let (app_tx, app_rx) = dispatch::channel::<AppCtx>(QueueKind::Application);
        let registry = HandleRegistry::new();
        registry.register_value(Node::new());

        let target = Arc::new(AtomicU64::new(0));
        Callback::new("test.result", HostRef::new(&target), 5, |t: &AtomicU64, v| {
            t.store(v, Ordering::SeqCst)
        })
        .dispatch(&app_tx)
        .unwrap();

        let result = finish_shutdown(
            Err(anyhow::anyhow!("render thread `tether-render` panicked")),
            AppQueue::new(app_rx),
            &registry,
        );

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("panicked"));
        assert_eq!(target.load(Ordering::SeqCst), 5);
        assert!(registry.is_empty());
    }
}
