use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tether_core::dispatch::RenderCtx;
use tether_core::handle::Handle;
use tether_core::host::HostRef;
use tether_core::{Bridge, BridgeError, Capture};

use crate::listener::{AssetLoader, CollisionListener, LoadListener, LoadOutcome, TextListener};
use crate::node::Node;
use crate::paint::Color;
use crate::text::{
    ClipMode, HorizontalAlignment, LineBreakMode, Text, TextProps, Typeface, VerticalAlignment,
};

/// Host-facing entry points for scene objects.
///
/// Every call resolves its handles on the calling thread and returns
/// immediately; the work itself runs on the render thread. Results the host
/// cares about come back through listener traits on the application queue.
///
/// Hops that must happen (first layout, geometry taken from a node the host is
/// about to destroy) retain their object. Property updates hold it weakly and
/// are dropped if the object is destroyed first.
#[derive(Clone)]
pub struct SceneBindings {
    bridge: Bridge,
}

impl SceneBindings {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    #[inline]
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    // ── text ──────────────────────────────────────────────────────────────

    /// Registers a text object, lays it out on the render thread, then tells
    /// `listener` the handle is ready.
    pub fn create_text(
        &self,
        props: TextProps,
        listener: Option<Arc<dyn TextListener>>,
    ) -> Result<Handle, BridgeError> {
        let handle = self.bridge.registry().register_value(Text::new(props));
        let listener = listener.as_ref().map(HostRef::new);
        let notifier = self.bridge.clone();

        let queued = self
            .bridge
            .on_render(handle, Capture::Retain, "text.create", move |text: &Text, ctx| {
                text.update(ctx);
                if let Some(listener) = listener {
                    notifier.notify("text.created", &listener, handle, |l, h| l.text_created(h))?;
                }
                Ok(())
            });

        if let Err(err) = queued {
            self.bridge.registry().release(handle).ok();
            return Err(err);
        }
        Ok(handle)
    }

    pub fn set_text(&self, handle: Handle, text: impl Into<String>) -> Result<(), BridgeError> {
        let text = text.into();
        self.update_text(handle, "text.set_text", move |t, ctx| t.set_text(ctx, text))
    }

    pub fn set_typeface(
        &self,
        handle: Handle,
        family: impl Into<String>,
        size: u32,
    ) -> Result<(), BridgeError> {
        let typeface = Typeface::new(family, size);
        self.update_text(handle, "text.set_typeface", move |t, ctx| {
            t.set_typeface(ctx, typeface)
        })
    }

    /// `argb` is packed `0xAARRGGBB`.
    pub fn set_color(&self, handle: Handle, argb: u32) -> Result<(), BridgeError> {
        let color = Color::from_argb(argb);
        self.update_text(handle, "text.set_color", move |t, ctx| t.set_color(ctx, color))
    }

    pub fn set_width(&self, handle: Handle, width: f32) -> Result<(), BridgeError> {
        self.update_text(handle, "text.set_width", move |t, ctx| t.set_width(ctx, width))
    }

    pub fn set_height(&self, handle: Handle, height: f32) -> Result<(), BridgeError> {
        self.update_text(handle, "text.set_height", move |t, ctx| t.set_height(ctx, height))
    }

    pub fn set_horizontal_alignment(&self, handle: Handle, name: &str) -> Result<(), BridgeError> {
        let alignment = HorizontalAlignment::from_name(name);
        self.update_text(handle, "text.set_horizontal_alignment", move |t, ctx| {
            t.set_horizontal_alignment(ctx, alignment)
        })
    }

    pub fn set_vertical_alignment(&self, handle: Handle, name: &str) -> Result<(), BridgeError> {
        let alignment = VerticalAlignment::from_name(name);
        self.update_text(handle, "text.set_vertical_alignment", move |t, ctx| {
            t.set_vertical_alignment(ctx, alignment)
        })
    }

    pub fn set_line_break_mode(&self, handle: Handle, name: &str) -> Result<(), BridgeError> {
        let mode = LineBreakMode::from_name(name);
        self.update_text(handle, "text.set_line_break_mode", move |t, ctx| {
            t.set_line_break_mode(ctx, mode)
        })
    }

    pub fn set_clip_mode(&self, handle: Handle, name: &str) -> Result<(), BridgeError> {
        let clip = ClipMode::from_name(name);
        self.update_text(handle, "text.set_clip_mode", move |t, ctx| t.set_clip_mode(ctx, clip))
    }

    pub fn set_max_lines(&self, handle: Handle, max_lines: u32) -> Result<(), BridgeError> {
        self.update_text(handle, "text.set_max_lines", move |t, ctx| {
            t.set_max_lines(ctx, max_lines)
        })
    }

    pub fn destroy_text(&self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy::<Text>(handle)
    }

    fn update_text<F>(&self, handle: Handle, label: &'static str, f: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&Text, &RenderCtx) + Send + 'static,
    {
        self.bridge
            .on_render(handle, Capture::Weak, label, move |text: &Text, ctx| {
                f(text, &*ctx);
                Ok(())
            })
    }

    // ── nodes ─────────────────────────────────────────────────────────────

    pub fn create_node(&self, name: impl Into<String>) -> Handle {
        self.bridge.registry().register_value(Node::new(name))
    }

    pub fn destroy_node(&self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy::<Node>(handle)
    }

    /// Copies the geometry of `source` onto `target` on the render thread.
    ///
    /// The source is kept alive for the hop, so the host may destroy it right
    /// after this returns. A target destroyed first is skipped.
    pub fn attach_to_node(&self, source: Handle, target: Handle) -> Result<(), BridgeError> {
        let source = self.bridge.registry().resolve::<Node>(source)?;

        self.bridge
            .on_render(target, Capture::Weak, "node.attach", move |target: &Node, ctx| {
                match source.geometry() {
                    Some(geometry) => target.set_geometry(ctx, Some(geometry)),
                    None => log::debug!(
                        "attach: `{}` has no geometry to give `{}`",
                        source.name(),
                        target.name()
                    ),
                }
                Ok(())
            })
    }

    /// Registers an empty node for `source` and loads its geometry on a
    /// loader thread.
    ///
    /// The handle is usable at once. When loading ends the geometry is
    /// installed on the render thread and `listener` receives the outcome,
    /// failures included. If the host destroys the node before that, nothing
    /// is installed or delivered.
    pub fn load_object(
        &self,
        source: impl Into<String>,
        loader: Arc<dyn AssetLoader>,
        listener: Option<Arc<dyn LoadListener>>,
    ) -> anyhow::Result<Handle> {
        let source = source.into();
        let handle = self.bridge.registry().register_value(Node::new(source.clone()));
        let listener = listener.as_ref().map(HostRef::new);
        let bridge = self.bridge.clone();

        let spawned = thread::Builder::new()
            .name("tether-loader".into())
            .spawn(move || {
                load_and_install(bridge, handle, source, loader, listener).ok();
            });

        if let Err(err) = spawned {
            self.bridge.registry().release(handle).ok();
            return Err(err).context("failed to spawn loader thread");
        }
        Ok(handle)
    }

    /// Points collision reports for `handle` at `listener`, or stops them
    /// with `None`. The node only keeps a weak reference.
    pub fn set_collision_listener(
        &self,
        handle: Handle,
        listener: Option<Arc<dyn CollisionListener>>,
    ) -> Result<(), BridgeError> {
        let listener = listener.as_ref().map(HostRef::new);
        self.bridge
            .on_render(handle, Capture::Weak, "node.set_collision_listener", move |node: &Node, ctx| {
                node.set_collision_listener(ctx, listener);
                Ok(())
            })
    }

    fn destroy<T>(&self, handle: Handle) -> Result<(), BridgeError>
    where
        T: Send + Sync + 'static,
    {
        // Refuse to release a handle of the wrong kind.
        drop(self.bridge.registry().resolve::<T>(handle)?);
        self.bridge.registry().release(handle)
    }
}

/// Runs on the loader thread. Failures to hand the result over are logged
/// here and returned for callers that want them.
fn load_and_install(
    bridge: Bridge,
    handle: Handle,
    source: String,
    loader: Arc<dyn AssetLoader>,
    listener: Option<HostRef<dyn LoadListener>>,
) -> Result<(), BridgeError> {
    let (geometry, outcome) = match loader.load(&source) {
        Ok(geometry) => {
            log::debug!("loaded `{source}` ({} vertices)", geometry.vertices.len());
            (Some(Arc::new(geometry)), LoadOutcome::Loaded)
        }
        Err(err) => {
            log::warn!("failed to load `{source}`: {err:#}");
            (None, LoadOutcome::Failed(format!("{err:#}")))
        }
    };

    let notifier = bridge.clone();
    let installed = bridge.on_render(handle, Capture::Weak, "node.load", move |node: &Node, ctx| {
        if let Some(geometry) = geometry {
            node.set_geometry(ctx, Some(geometry));
        }
        if let Some(listener) = listener {
            notifier.notify("node.loaded", &listener, outcome, move |l, outcome| {
                l.object_loaded(handle, outcome)
            })?;
        }
        Ok(())
    });

    match &installed {
        Ok(()) => {}
        Err(BridgeError::QueueUnavailable(_)) => {
            log::warn!("`{source}` finished loading after shutdown; result dropped")
        }
        Err(err) => log::debug!("`{source}` finished loading but was not installed: {err}"),
    }
    installed
}
