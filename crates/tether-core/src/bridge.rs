use std::any::Any;
use std::sync::Arc;

use crate::dispatch::{AppCtx, Callback, Dispatcher, RenderCtx};
use crate::error::BridgeError;
use crate::handle::{Handle, HandleRegistry};
use crate::host::HostRef;

/// How a render unit holds the object it mutates across the queue hop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capture {
    /// Keep the object alive until the unit has run, even if the host releases
    /// its handle in the meantime. For work that must happen (first layout,
    /// geometry handed over from an object about to be destroyed).
    Retain,
    /// Do not delay destruction. If the object is gone when the unit runs, the
    /// unit is skipped. For property updates nobody will observe any more.
    Weak,
}

/// Everything a binding needs to cross the boundary.
///
/// Cheap to clone; every clone shares the same registry and queues. Bindings
/// receive a `Bridge` instead of reaching for process-wide state.
#[derive(Clone)]
pub struct Bridge {
    registry: Arc<HandleRegistry>,
    render: Dispatcher<RenderCtx>,
    app: Dispatcher<AppCtx>,
}

impl Bridge {
    pub fn new(
        registry: Arc<HandleRegistry>,
        render: Dispatcher<RenderCtx>,
        app: Dispatcher<AppCtx>,
    ) -> Self {
        Self {
            registry,
            render,
            app,
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    #[inline]
    pub fn render(&self) -> &Dispatcher<RenderCtx> {
        &self.render
    }

    #[inline]
    pub fn app(&self) -> &Dispatcher<AppCtx> {
        &self.app
    }

    /// Resolves `handle` now and runs `f` against its object on the render thread.
    ///
    /// Resolution errors are returned immediately. `capture` decides whether
    /// the queued unit keeps the object alive or skips it once destroyed.
    pub fn on_render<T, F>(
        &self,
        handle: Handle,
        capture: Capture,
        label: &'static str,
        f: F,
    ) -> Result<(), BridgeError>
    where
        T: Any + Send + Sync,
        F: FnOnce(&T, &mut RenderCtx) -> anyhow::Result<()> + Send + 'static,
    {
        let object = self.registry.resolve::<T>(handle)?;

        match capture {
            Capture::Retain => self.render.submit(label, move |ctx| f(&object, ctx)),
            Capture::Weak => {
                let object = Arc::downgrade(&object);
                self.render.submit(label, move |ctx| match object.upgrade() {
                    Some(object) => f(&object, ctx),
                    None => {
                        log::trace!("`{label}` skipped: {handle} was destroyed before the hop");
                        Ok(())
                    }
                })
            }
        }
    }

    /// Queues `deliver(target, payload)` for the host thread through the
    /// callback adapter.
    pub fn notify<T, P, D>(
        &self,
        label: &'static str,
        target: &HostRef<T>,
        payload: P,
        deliver: D,
    ) -> Result<(), BridgeError>
    where
        T: ?Sized + Send + Sync + 'static,
        P: Send + 'static,
        D: FnOnce(&T, P) + Send + 'static,
    {
        Callback::new(label, target.clone(), payload, deliver).dispatch(&self.app)
    }
}
