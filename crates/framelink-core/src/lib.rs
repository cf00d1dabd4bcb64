//! Framelink core crate.
//!
//! This crate owns the frame-delivery pieces used by higher layers: tick
//! sources (the stand-in for a platform vsync timer), the frame dispatcher
//! that fans ticks out to registered listeners, and frame-rate tracking.

pub mod dispatch;
pub mod logging;
pub mod source;
