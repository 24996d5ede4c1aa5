//! Opaque handles and the registry that maps them to shared native objects.
//!
//! A handle is the only thing the host ever holds. The registry owns one strong
//! share of each registered object; everything else (queued units, scene
//! links) holds its own `Arc` and keeps the object alive independently.

mod id;
mod registry;

pub use id::Handle;
pub use registry::HandleRegistry;
