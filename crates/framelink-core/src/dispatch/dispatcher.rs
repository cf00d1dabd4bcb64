use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use crate::source::{DEFAULT_FPS, IntervalSource, Tick, TickSink, TickSource};

use super::registry::{ListenId, ListenerRegistry};

/// Frame dispatcher: bridges one tick source to registered listeners.
///
/// A dispatcher is a cheap-clone handle; all clones share the same source,
/// listener set, and fps tracking. Construction acquires and starts the
/// source immediately — there is no separate activation call — and the
/// source is stopped when the last handle is dropped, taking every
/// remaining listener entry with it.
///
/// Shared state sits behind a lock with the dispatch path as its sole
/// writer, and the lock is never held while listener callbacks run. That
/// makes `listen`, `unlisten`, and `stop` safe to call from inside a
/// callback — including a listener removing itself mid-tick.
#[derive(Clone)]
pub struct FrameDispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<DispatchState>,
    source: Mutex<SourceSlot>,
}

struct DispatchState {
    registry: ListenerRegistry,
    last_tick: Option<Instant>,
    fps: f64,
    fps_taps: Vec<mpsc::Sender<f64>>,
}

struct SourceSlot {
    source: Box<dyn TickSource>,
    attached: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FrameDispatcher {
    /// Dispatcher backed by a thread timer at the default rate.
    pub fn new() -> Self {
        Self::with_source(Box::new(IntervalSource::default_rate()))
    }

    /// Dispatcher backed by a thread timer capped at `fps`.
    pub fn with_preferred_fps(fps: f64) -> Self {
        Self::with_source(Box::new(IntervalSource::new(fps)))
    }

    /// Dispatcher over a caller-supplied source. Starts immediately.
    pub fn with_source(source: Box<dyn TickSource>) -> Self {
        let dispatcher = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DispatchState {
                    registry: ListenerRegistry::new(),
                    last_tick: None,
                    fps: DEFAULT_FPS,
                    fps_taps: Vec::new(),
                }),
                source: Mutex::new(SourceSlot {
                    source,
                    attached: false,
                }),
            }),
        };
        dispatcher.start();
        dispatcher
    }

    /// (Re-)attaches the tick source. No-op while attached.
    ///
    /// A source that fails to attach leaves the dispatcher in a valid
    /// never-ticks state: listeners stay registered, `fps` and `max_fps`
    /// keep their defined defaults, and a later `start` may succeed.
    pub fn start(&self) {
        let mut slot = lock(&self.shared.source);
        if slot.attached {
            return;
        }
        match slot.source.start(self.tick_sink()) {
            Ok(()) => slot.attached = true,
            Err(e) => log::warn!("tick source failed to start: {e:#}"),
        }
    }

    /// Detaches the tick source. No-op while detached.
    pub fn stop(&self) {
        let mut slot = lock(&self.shared.source);
        if slot.attached {
            slot.source.stop();
            slot.attached = false;
        }
    }

    /// Registers a callback invoked once per tick; returns its identifier.
    ///
    /// Safe to call from within a dispatch in progress: the new listener is
    /// not part of the tick currently being delivered, but receives every
    /// tick after it.
    pub fn listen(&self, listener: impl Fn(Tick) + Send + Sync + 'static) -> ListenId {
        lock(&self.shared.state).registry.add(Arc::new(listener))
    }

    /// Removes a previously registered callback.
    ///
    /// Unknown or already-removed identifiers are ignored. Safe to call
    /// from within the callback's own invocation.
    pub fn unlisten(&self, id: ListenId) {
        lock(&self.shared.state).registry.remove(id);
    }

    /// Observed frame rate: the reciprocal of the last tick interval.
    ///
    /// Starts at (and degrades to) 1.0 when no interval has been observed.
    pub fn fps(&self) -> f64 {
        lock(&self.shared.state).fps
    }

    /// Frame-rate ceiling reported by the source.
    pub fn max_fps(&self) -> f64 {
        lock(&self.shared.source).source.max_fps()
    }

    /// Stream of fps recomputations, one value per measured interval.
    ///
    /// Intended for diagnostics; dropped receivers are pruned on the next
    /// update.
    pub fn fps_updates(&self) -> mpsc::Receiver<f64> {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared.state).fps_taps.push(tx);
        rx
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.shared.state).registry.len()
    }

    fn tick_sink(&self) -> TickSink {
        // The source outlives dispatch teardown by up to one period, so it
        // must not keep the shared state alive: downgrade the handle.
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |tick| {
            if let Some(shared) = weak.upgrade() {
                shared.on_tick(tick);
            }
        })
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn on_tick(&self, tick: Tick) {
        let snapshot = {
            let mut state = lock(&self.state);

            if let Some(prev) = state.last_tick {
                let delta = tick.at.saturating_duration_since(prev).as_secs_f64();
                // A zero interval would produce a non-finite rate; treat it
                // as "no update this tick".
                if delta > 0.0 {
                    state.fps = 1.0 / delta;
                    let fps = state.fps;
                    state.fps_taps.retain(|tap| tap.send(fps).is_ok());
                }
            }
            state.last_tick = Some(tick.at);

            state.registry.snapshot()
        };

        // Lock released: listeners may re-enter the dispatcher freely.
        for (_, listener) in snapshot {
            listener(tick);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let slot = self
            .source
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.attached {
            slot.source.stop();
        }
    }
}
