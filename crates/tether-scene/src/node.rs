use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::dispatch::{AppCtx, Callback, Dispatcher, RenderCtx};
use tether_core::host::HostRef;
use tether_core::BridgeError;

use crate::coords::Vec3;
use crate::listener::CollisionListener;

/// Vertex data attached to a node. Immutable once built, so nodes share it.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<Vec3>,
}

impl Geometry {
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            vertices,
        }
    }
}

/// A contact reported by the physics collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Tag of the other body.
    pub tag: String,
    pub point: Vec3,
    pub normal: Vec3,
}

#[derive(Default)]
struct NodeState {
    geometry: Option<Arc<Geometry>>,
    collision_listener: Option<HostRef<dyn CollisionListener>>,
}

/// A render-owned scene node.
pub struct Node {
    name: String,
    state: Mutex<NodeState>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Option<Arc<Geometry>> {
        self.state.lock().geometry.clone()
    }

    pub fn has_collision_listener(&self) -> bool {
        self.state.lock().collision_listener.is_some()
    }

    pub fn set_geometry(&self, _ctx: &RenderCtx, geometry: Option<Arc<Geometry>>) {
        self.state.lock().geometry = geometry;
    }

    pub fn set_collision_listener(
        &self,
        _ctx: &RenderCtx,
        listener: Option<HostRef<dyn CollisionListener>>,
    ) {
        self.state.lock().collision_listener = listener;
    }

    /// Queues `on_collided` for this node's listener, if any.
    ///
    /// The listener is resolved when the host drains, not here.
    pub fn report_collision(
        &self,
        _ctx: &RenderCtx,
        app: &Dispatcher<AppCtx>,
        collision: Collision,
    ) -> Result<(), BridgeError> {
        let Some(listener) = self.state.lock().collision_listener.clone() else {
            log::trace!("node `{}` collided with `{}`; nobody listening", self.name, collision.tag);
            return Ok(());
        };

        Callback::new(
            "node.collided",
            listener,
            collision,
            |listener, collision| listener.on_collided(&collision),
        )
        .dispatch(app)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("geometry", &state.geometry.as_ref().map(|g| g.name.as_str()))
            .field("collision_listener", &state.collision_listener.is_some())
            .finish()
    }
}
