//! Host-side references.
//!
//! The host owns its callback targets. The bridge only ever keeps a
//! [`HostRef`], which never extends the target's lifetime.

mod weak_ref;

pub use weak_ref::HostRef;
