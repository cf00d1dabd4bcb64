use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::{DEFAULT_FPS, Tick, TickSink, TickSource};

/// Externally driven tick source.
///
/// Embedders that already own a frame loop — and tests that need synthetic
/// timestamps — drive ticks by hand through the paired [`ManualHandle`].
/// Ticks fired while the source is detached are dropped.
pub struct ManualSource {
    rate: f64,
    slot: Arc<Mutex<Slot>>,
}

/// Driving end of a [`ManualSource`]. Cheap to clone.
#[derive(Clone)]
pub struct ManualHandle {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    sink: Option<TickSink>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManualSource {
    /// Source/handle pair reporting [`DEFAULT_FPS`] as its ceiling.
    pub fn new() -> (ManualSource, ManualHandle) {
        Self::with_max_fps(DEFAULT_FPS)
    }

    /// Source/handle pair reporting `rate` as its ceiling.
    pub fn with_max_fps(rate: f64) -> (ManualSource, ManualHandle) {
        let slot = Arc::new(Mutex::new(Slot::default()));
        let handle = ManualHandle {
            slot: Arc::clone(&slot),
        };
        (ManualSource { rate, slot }, handle)
    }
}

impl TickSource for ManualSource {
    fn start(&mut self, sink: TickSink) -> anyhow::Result<()> {
        let mut slot = lock(&self.slot);
        if slot.sink.is_none() {
            slot.sink = Some(sink);
        }
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.slot).sink = None;
    }

    fn max_fps(&self) -> f64 {
        self.rate
    }
}

impl ManualHandle {
    /// Delivers one tick with the given timestamp. No-op while detached.
    ///
    /// The sink runs on the calling thread, synchronously.
    pub fn fire(&self, at: Instant) {
        // Clone the sink out of the lock so the callback can re-enter the
        // source (stop, restart) without deadlocking.
        let sink = lock(&self.slot).sink.clone();
        if let Some(sink) = sink {
            sink(Tick { at });
        }
    }

    /// Delivers one tick stamped with the current instant.
    pub fn fire_now(&self) {
        self.fire(Instant::now());
    }

    /// Whether a sink is currently attached.
    pub fn is_attached(&self) -> bool {
        lock(&self.slot).sink.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_sink(count: &Arc<AtomicUsize>) -> TickSink {
        let count = Arc::clone(count);
        Arc::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fire_before_start_is_dropped() {
        let (_src, handle) = ManualSource::new();
        assert!(!handle.is_attached());
        handle.fire_now(); // absorbed
    }

    #[test]
    fn fire_reaches_sink_after_start() {
        let count = Arc::new(AtomicUsize::new(0));
        let (mut src, handle) = ManualSource::new();
        src.start(counting_sink(&count)).unwrap();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + Duration::from_millis(16));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stop_detaches_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let (mut src, handle) = ManualSource::new();
        src.start(counting_sink(&count)).unwrap();
        src.stop();

        handle.fire_now();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!handle.is_attached());
    }

    #[test]
    fn reports_configured_ceiling() {
        let (src, _handle) = ManualSource::with_max_fps(144.0);
        assert_eq!(src.max_fps(), 144.0);

        let (src, _handle) = ManualSource::new();
        assert_eq!(src.max_fps(), DEFAULT_FPS);
    }
}
