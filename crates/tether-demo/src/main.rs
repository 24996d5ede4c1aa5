use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tether_core::dispatch::RenderCtx;
use tether_core::handle::Handle;
use tether_core::logging::LoggingConfig;
use tether_core::{Capture, RenderConfig, Runtime, RuntimeConfig};
use tether_scene::coords::Vec3;
use tether_scene::listener::{CollisionListener, LoadListener, LoadOutcome, TextListener};
use tether_scene::node::{Collision, Geometry, Node};
use tether_scene::text::{Text, TextProps, Typeface};
use tether_scene::SceneBindings;

/// Host-side listener that just reports what arrives.
#[derive(Default)]
struct Console {
    received: AtomicU64,
}

impl Console {
    fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }
}

impl TextListener for Console {
    fn text_created(&self, handle: Handle) {
        self.bump();
        log::info!("text {handle} is ready");
    }
}

impl LoadListener for Console {
    fn object_loaded(&self, handle: Handle, outcome: LoadOutcome) {
        self.bump();
        match outcome {
            LoadOutcome::Loaded => log::info!("object {handle} loaded"),
            LoadOutcome::Failed(reason) => log::warn!("object {handle} failed: {reason}"),
        }
    }
}

impl CollisionListener for Console {
    fn on_collided(&self, collision: &Collision) {
        self.bump();
        log::info!(
            "collided with `{}` at ({:.1}, {:.1}, {:.1})",
            collision.tag,
            collision.point.x,
            collision.point.y,
            collision.point.z
        );
    }
}

/// Stands in for a file parser: a unit quad whose name is the source.
fn procedural_quad(source: &str) -> Result<Geometry> {
    if source.is_empty() {
        bail!("empty source");
    }
    Ok(Geometry::new(
        source,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
    ))
}

/// Drains the application queue until `expected` deliveries arrived.
fn pump(runtime: &mut Runtime, console: &Console, expected: u64) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while console.received() < expected {
        if Instant::now() >= deadline {
            bail!("timed out after {} of {expected} deliveries", console.received());
        }
        runtime.app_queue().wait_and_drain(Duration::from_millis(50))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = RuntimeConfig::default()
        .with_logging(LoggingConfig::default())
        .with_render(RenderConfig::default().with_max_units_per_frame(Some(64)));

    let mut runtime = Runtime::start_with_hook(config, |ctx: &RenderCtx| {
        let frame = ctx.frame();
        if frame.frame_index % 120 == 0 {
            log::debug!("frame {} (dt {:.4}s)", frame.frame_index, frame.dt);
        }
    })?;

    let scene = SceneBindings::new(runtime.bridge().clone());
    let console = Arc::new(Console::default());

    // ── text ──────────────────────────────────────────────────────────────
    let title = scene.create_text(
        TextProps::new("tether demo").with_typeface(Typeface::new("sans-serif", 24)),
        Some(console.clone()),
    )?;
    scene.set_text(title, "objects cross threads by handle, results come back by listener")?;
    scene.set_width(title, 240.0)?;
    scene.set_line_break_mode(title, "WordWrap")?;
    scene.set_horizontal_alignment(title, "center")?;
    scene.set_color(title, 0xFF33_99FF)?;
    pump(&mut runtime, &console, 1)?;

    // ── nodes ─────────────────────────────────────────────────────────────
    let loaded = scene.load_object("meshes/quad.obj", Arc::new(procedural_quad), Some(console.clone()))?;
    pump(&mut runtime, &console, 2)?;

    let target = scene.create_node("stage");
    scene.attach_to_node(loaded, target)?;
    scene.destroy_node(loaded)?;
    scene.set_collision_listener(target, Some(console.clone()))?;

    // A physics step would do this from inside the render loop.
    let app = scene.bridge().app().clone();
    scene
        .bridge()
        .on_render(target, Capture::Retain, "demo.collide", move |node: &Node, ctx| {
            node.report_collision(
                ctx,
                &app,
                Collision {
                    tag: "floor".into(),
                    point: Vec3::new(0.5, 0.0, 0.5),
                    normal: Vec3::new(0.0, 1.0, 0.0),
                },
            )?;
            Ok(())
        })?;
    pump(&mut runtime, &console, 3)?;

    // ── results ───────────────────────────────────────────────────────────
    let text = scene.bridge().registry().resolve::<Text>(title)?;
    for line in text.layout().lines {
        log::info!("  [{:>6.1}, {:>5.1}] {}", line.x, line.y, line.text);
    }
    drop(text);

    let stage = scene.bridge().registry().resolve::<Node>(target)?;
    if let Some(geometry) = stage.geometry() {
        log::info!("`{}` shows `{}` ({} vertices)", stage.name(), geometry.name, geometry.vertices.len());
    }
    drop(stage);

    scene.destroy_text(title)?;
    scene.destroy_node(target)?;

    let leaked = runtime.shutdown()?;
    log::info!("done ({} deliveries, {leaked} leaked handle(s))", console.received());
    Ok(())
}
