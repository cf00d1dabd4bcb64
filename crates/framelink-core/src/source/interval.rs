use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::{DEFAULT_RATE, Tick, TickSink, TickSource};

/// Thread-backed tick source.
///
/// A named background thread fires the sink, then sleeps one frame
/// interval, until stopped. The sleep-based schedule makes the configured
/// rate a ceiling, not a guarantee — exactly the contract a real display
/// timer offers.
pub struct IntervalSource {
    rate: f64,
    run: Option<Arc<AtomicBool>>,
}

impl IntervalSource {
    /// Source capped at `rate` frames per second.
    ///
    /// Non-positive or non-finite rates fall back to [`DEFAULT_RATE`].
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            DEFAULT_RATE
        };
        Self { rate, run: None }
    }

    /// Source at [`DEFAULT_RATE`].
    pub fn default_rate() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

impl TickSource for IntervalSource {
    fn start(&mut self, sink: TickSink) -> Result<()> {
        if self.run.is_some() {
            return Ok(());
        }

        let run = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&run);
        let period = Duration::from_secs_f64(1.0 / self.rate);

        thread::Builder::new()
            .name("framelink-ticker".to_string())
            .spawn(move || {
                while flag.load(Ordering::Relaxed) {
                    sink(Tick { at: Instant::now() });
                    thread::sleep(period);
                }
            })
            .context("failed to spawn tick thread")?;

        self.run = Some(run);
        Ok(())
    }

    fn stop(&mut self) {
        // Each run owns its own flag, so a start() immediately after stop()
        // cannot race an exiting thread. The old thread is not joined: it
        // observes the flag within one period and exits on its own, which
        // keeps stop() safe to call from inside a tick callback.
        if let Some(run) = self.run.take() {
            run.store(false, Ordering::Relaxed);
        }
    }

    fn max_fps(&self) -> f64 {
        self.rate
    }
}

impl Drop for IntervalSource {
    fn drop(&mut self) {
        self.stop();
    }
}
