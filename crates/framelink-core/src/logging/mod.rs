//! Logging utilities.
//!
//! Centralizes logger initialization for hosts that do not bring their own
//! `log` backend. The library itself only uses the `log` facade, so
//! embedders with an existing logger can skip this module entirely.

mod init;

pub use init::{LoggingConfig, init_logging};
