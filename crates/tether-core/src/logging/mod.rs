//! Logging setup.
//!
//! Everything in the workspace logs through the `log` facade. Hosts that
//! already install a logger can skip this module entirely.

mod init;

pub use init::{init_logging, LoggingConfig};
