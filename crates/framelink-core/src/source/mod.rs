//! Tick sources.
//!
//! A tick source stands in for the platform vsync timer: once started, it
//! delivers one [`Tick`] per frame interval to the sink installed by
//! [`TickSource::start`]. The dispatcher is written once against the trait;
//! backends are interchangeable.
//!
//! Intended usage:
//! - [`IntervalSource`] when the process has no frame loop of its own
//! - [`ManualSource`] when the embedder already owns one (or in tests)

mod interval;
mod manual;

pub use interval::IntervalSource;
pub use manual::{ManualHandle, ManualSource};

use std::sync::Arc;
use std::time::Instant;

/// Defined fallback rate when no timer has been acquired.
pub const DEFAULT_FPS: f64 = 1.0;

/// Default preferred rate for thread-backed sources.
pub const DEFAULT_RATE: f64 = 60.0;

/// One frame-interval timer firing.
#[derive(Debug, Copy, Clone)]
pub struct Tick {
    /// Monotonic timestamp taken at the tick.
    pub at: Instant,
}

impl Tick {
    #[inline]
    pub fn now() -> Self {
        Self { at: Instant::now() }
    }
}

/// Sink installed by the dispatcher; invoked once per tick.
pub type TickSink = Arc<dyn Fn(Tick) + Send + Sync>;

/// Frame-interval timer contract.
///
/// Implementations may deliver ticks from their own thread; the dispatcher
/// serializes all shared-state access behind its own lock, so sinks only
/// need to be callable, not re-entrant.
pub trait TickSource: Send {
    /// Attaches the source and begins delivering ticks to `sink`.
    ///
    /// Idempotent: a second call while attached is a no-op.
    fn start(&mut self, sink: TickSink) -> anyhow::Result<()>;

    /// Detaches the source. Idempotent and safe to call during teardown.
    fn stop(&mut self);

    /// Frame-rate ceiling of the underlying timer.
    ///
    /// Sources without a meaningful ceiling report [`DEFAULT_FPS`].
    fn max_fps(&self) -> f64;
}
