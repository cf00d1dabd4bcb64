//! Framelink animation — bounded-duration animators on top of
//! `framelink-core`.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use framelink_core::dispatch::FrameDispatcher;
//! use framelink_anim::Animator;
//!
//! let dispatcher = FrameDispatcher::with_preferred_fps(60.0);
//!
//! let fade = Animator::new(&dispatcher, Duration::from_millis(300))
//!     .on_frame(|progress| {
//!         set_opacity(progress.eased_in_out(1));
//!     })
//!     .on_complete(|finished| {
//!         if finished {
//!             remove_overlay();
//!         }
//!     });
//! fade.run();
//! ```
//!
//! Three flavors share one state machine:
//! - [`Animator`] — synchronous per-frame and completion callbacks
//! - [`AsyncAnimator`] — suspending callbacks driven on a tokio runtime,
//!   with at-most-one frame invocation in flight per animator
//! - [`Animation`] — fire-and-forget loop that starts on construction

pub mod animation;
pub mod animator;
pub mod async_animator;
pub mod easing;
pub mod progress;

pub use animation::Animation;
pub use animator::{Animator, State};
pub use async_animator::AsyncAnimator;
pub use progress::Progress;

pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
