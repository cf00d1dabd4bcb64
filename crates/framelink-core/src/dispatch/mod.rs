//! Frame dispatch.
//!
//! [`FrameDispatcher`] bridges one tick source to a dynamic set of
//! listeners and tracks a per-tick frame-rate estimate. The listener set
//! itself lives in [`ListenerRegistry`], an identity-keyed collection with
//! snapshot iteration so registration and removal stay safe mid-dispatch.

mod dispatcher;
mod registry;

pub use dispatcher::FrameDispatcher;
pub use registry::{ListenId, Listener, ListenerRegistry};
