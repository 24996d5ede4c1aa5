//! Scene-space math types.
//!
//! Only what the bindings carry across the boundary; the renderer owns the
//! real math library.

mod vec3;

pub use vec3::Vec3;
