//! Animation progress.
//!
//! A [`Progress`] is the immutable per-frame value an animator hands to its
//! frame callback: elapsed seconds, a contiguous frame index, and a
//! completion fraction in `[0, 1]`.

use std::time::Duration;

use crate::easing;

/// One frame's worth of animation progress.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Progress {
    /// Elapsed time in seconds, clamped to the duration on the final frame.
    pub time: f64,
    /// Frame index, starting at 0 and increasing by exactly 1 per
    /// delivered non-terminal frame.
    pub index: u64,
    /// Completion fraction: `min(elapsed / duration, 1.0)`.
    pub fraction: f64,
}

impl Progress {
    pub const ZERO: Progress = Progress {
        time: 0.0,
        index: 0,
        fraction: 0.0,
    };

    /// Progress for a frame `elapsed` into a run of `duration`.
    ///
    /// At or past the duration the terminal value is forced exact:
    /// `time == duration` and `fraction == 1.0`, regardless of overshoot.
    /// A zero duration completes immediately.
    #[must_use]
    pub fn at(elapsed: Duration, duration: Duration, index: u64) -> Self {
        if elapsed >= duration {
            return Self {
                time: duration.as_secs_f64(),
                index,
                fraction: 1.0,
            };
        }
        let time = elapsed.as_secs_f64();
        Self {
            time,
            index,
            fraction: time / duration.as_secs_f64(),
        }
    }

    /// Whether this is a terminal frame.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fraction >= 1.0
    }

    /// Fraction remapped through [`easing::ease_in_out`], composed
    /// `iterations` times (0 = raw fraction).
    #[inline]
    #[must_use]
    pub fn eased_in_out(&self, iterations: u32) -> f64 {
        easing::compose(easing::ease_in_out, self.fraction, iterations)
    }

    /// Fraction remapped through [`easing::ease_in`].
    #[inline]
    #[must_use]
    pub fn eased_in(&self, iterations: u32) -> f64 {
        easing::compose(easing::ease_in, self.fraction, iterations)
    }

    /// Fraction remapped through [`easing::ease_out`].
    #[inline]
    #[must_use]
    pub fn eased_out(&self, iterations: u32) -> f64 {
        easing::compose(easing::ease_out, self.fraction, iterations)
    }
}
