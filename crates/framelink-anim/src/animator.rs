//! Bounded-duration animator with synchronous callbacks.
//!
//! An [`Animator`] subscribes to a [`FrameDispatcher`], advances through
//! `Ready → Running → Done | Cancelled`, and reports per-frame
//! [`Progress`] plus a terminal completion signal. Terminal states never
//! transition further, and every exit path removes the animator's listener
//! entry from the dispatcher — including dropping the handle mid-run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use framelink_core::dispatch::{FrameDispatcher, ListenId};

use crate::lock;
use crate::progress::Progress;

/// Animator lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    Ready,
    Running,
    Done,
    Cancelled,
}

impl State {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Done | State::Cancelled)
    }
}

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Fresh process-wide animator identity.
pub(crate) fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

type FrameFn = Arc<dyn Fn(Progress) + Send + Sync>;
type CompleteFn = Box<dyn FnOnce(bool) + Send>;

/// Synchronous-callback animator.
///
/// Callbacks are configured builder-style before [`run`](Self::run):
///
/// ```rust,ignore
/// let animator = Animator::new(&dispatcher, Duration::from_secs(1))
///     .on_frame(|p| draw(p.eased_out(1)))
///     .on_complete(|finished| log::debug!("finished: {finished}"));
/// animator.run();
/// ```
///
/// Two animators compare equal only if they are the same animator:
/// equality is by construction-time identity, never by state or progress.
pub struct Animator {
    identity: u64,
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    dispatcher: FrameDispatcher,
    duration: Duration,
    state: State,
    /// Timestamp of the first delivered tick; anchors elapsed time so the
    /// whole run is derived from source timestamps.
    origin: Option<Instant>,
    index: u64,
    progress: Progress,
    on_frame: Option<FrameFn>,
    on_complete: Option<CompleteFn>,
    listen: Option<ListenId>,
}

impl Animator {
    /// Animator in the `Ready` state; nothing is registered yet.
    pub fn new(dispatcher: &FrameDispatcher, duration: Duration) -> Self {
        Self {
            identity: next_identity(),
            inner: Arc::new(Mutex::new(Inner {
                dispatcher: dispatcher.clone(),
                duration,
                state: State::Ready,
                origin: None,
                index: 0,
                progress: Progress::ZERO,
                on_frame: None,
                on_complete: None,
                listen: None,
            })),
        }
    }

    /// Sets the per-frame callback. Ignored once the animator has run.
    #[must_use]
    pub fn on_frame(self, f: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        {
            let mut inner = lock(&self.inner);
            if inner.state == State::Ready {
                inner.on_frame = Some(Arc::new(f));
            }
        }
        self
    }

    /// Sets the completion callback, invoked at most once with `true` on
    /// natural completion or `false` on cancellation. Ignored once the
    /// animator has run.
    #[must_use]
    pub fn on_complete(self, f: impl FnOnce(bool) + Send + 'static) -> Self {
        {
            let mut inner = lock(&self.inner);
            if inner.state == State::Ready {
                inner.on_complete = Some(Box::new(f));
            }
        }
        self
    }

    /// Starts the run. No-op unless `Ready`.
    ///
    /// Registers one dispatcher listener; the run's time origin anchors to
    /// the first tick the listener receives.
    pub fn run(&self) {
        {
            let mut inner = lock(&self.inner);
            if inner.state != State::Ready {
                return;
            }
            inner.state = State::Running;
        }

        // The registry entry must not keep the animator alive: a dropped
        // handle has to be observably gone by the next tick.
        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let dispatcher = lock(&self.inner).dispatcher.clone();
        let id = dispatcher.listen(move |tick| {
            if let Some(inner) = weak.upgrade() {
                drive(&inner, tick.at);
            }
        });

        let mut inner = lock(&self.inner);
        if inner.state == State::Running {
            inner.listen = Some(id);
        } else {
            // Cancelled while registering: the entry must not outlive us.
            drop(inner);
            dispatcher.unlisten(id);
        }
    }

    /// Cancels a running animation. No-op unless `Running`.
    ///
    /// Invokes the completion callback with `false` — unless no frame has
    /// been delivered yet, in which case neither callback fires — and
    /// removes the dispatcher listener.
    pub fn cancel(&self) {
        finish(&self.inner, false);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        lock(&self.inner).state
    }

    /// Progress delivered with the most recent frame.
    pub fn progress(&self) -> Progress {
        lock(&self.inner).progress
    }

    /// Configured run duration.
    pub fn duration(&self) -> Duration {
        lock(&self.inner).duration
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Animator {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Animator {}

impl Drop for Animator {
    fn drop(&mut self) {
        // Hard invariant: a dropped animator leaves no registry entry
        // behind. Callbacks are not invoked on drop.
        let unlisten = {
            let mut inner = lock(&self.inner);
            inner
                .listen
                .take()
                .map(|id| (inner.dispatcher.clone(), id))
        };
        if let Some((dispatcher, id)) = unlisten {
            dispatcher.unlisten(id);
        }
    }
}

/// Per-tick step: computes the next frame and fires callbacks with no lock
/// held, so a frame callback may cancel or inspect the animator freely.
fn drive(inner: &Arc<Mutex<Inner>>, at: Instant) {
    let (on_frame, progress, finished) = {
        let mut st = lock(inner);
        if st.state != State::Running {
            return;
        }
        let origin = *st.origin.get_or_insert(at);
        let elapsed = at.saturating_duration_since(origin);
        let progress = Progress::at(elapsed, st.duration, st.index);
        st.progress = progress;
        let finished = progress.is_complete();
        if !finished {
            st.index += 1;
        }
        (st.on_frame.clone(), progress, finished)
    };

    if let Some(f) = &on_frame {
        f(progress);
    }
    if finished {
        finish(inner, true);
    }
}

/// Single exit path for both completion and cancellation; the `Running`
/// check under the lock makes the terminal transition (and the completion
/// callback) fire at most once even under re-entrant cancels.
fn finish(inner: &Arc<Mutex<Inner>>, completed: bool) {
    let (on_complete, unlisten) = {
        let mut st = lock(inner);
        if st.state != State::Running {
            return;
        }
        st.state = if completed {
            State::Done
        } else {
            State::Cancelled
        };
        // A cancel before any delivered frame fires no callbacks at all.
        let deliverable = completed || st.origin.is_some();
        let on_complete = if deliverable {
            st.on_complete.take()
        } else {
            None
        };
        (
            on_complete,
            st.listen.take().map(|id| (st.dispatcher.clone(), id)),
        )
    };

    if let Some(f) = on_complete {
        f(completed);
    }
    if let Some((dispatcher, id)) = unlisten {
        dispatcher.unlisten(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framelink_core::source::{ManualHandle, ManualSource};
    use std::time::Duration;

    fn manual_dispatcher() -> (FrameDispatcher, ManualHandle) {
        let (source, handle) = ManualSource::new();
        (FrameDispatcher::with_source(Box::new(source)), handle)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    /// Records every delivered (index, fraction, time) triple.
    fn frame_recorder() -> (
        Arc<Mutex<Vec<(u64, f64, f64)>>>,
        impl Fn(Progress) + Send + Sync + 'static,
    ) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&frames);
        (frames, move |p: Progress| {
            lock(&sink).push((p.index, p.fraction, p.time));
        })
    }

    /// Records completion invocations.
    fn completion_recorder() -> (Arc<Mutex<Vec<bool>>>, impl FnOnce(bool) + Send + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |finished: bool| lock(&sink).push(finished))
    }

    // ── run to completion ─────────────────────────────────────────────────

    #[test]
    fn runs_to_completion_with_clamped_terminal_frame() {
        // duration 1.0s, ticks at 0.0 / 0.3 / 0.6 / 1.2:
        // frames (0, 0.0), (1, 0.3), (2, 0.6), then the terminal frame
        // clamped to fraction 1.0 and time 1.0.
        let (dispatcher, handle) = manual_dispatcher();
        let (frames, on_frame) = frame_recorder();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(1.0))
            .on_frame(on_frame)
            .on_complete(on_complete);
        assert_eq!(animator.state(), State::Ready);

        animator.run();
        assert_eq!(animator.state(), State::Running);

        let base = Instant::now();
        for t in [0.0, 0.3, 0.6, 1.2] {
            handle.fire(base + secs(t));
        }

        let frames = lock(&frames).clone();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].0, 0);
        assert!(frames[0].1.abs() < 1e-9);
        assert_eq!(frames[1].0, 1);
        assert!((frames[1].1 - 0.3).abs() < 1e-9);
        assert_eq!(frames[2].0, 2);
        assert!((frames[2].1 - 0.6).abs() < 1e-9);

        // Terminal frame: exact clamp despite the 0.2s overshoot.
        let (_, fraction, time) = frames[3];
        assert_eq!(fraction, 1.0);
        assert_eq!(time, 1.0);

        assert_eq!(animator.state(), State::Done);
        assert_eq!(*lock(&completions), vec![true]);
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn frame_indices_are_contiguous_from_zero() {
        let (dispatcher, handle) = manual_dispatcher();
        let (frames, on_frame) = frame_recorder();

        let animator = Animator::new(&dispatcher, secs(1.0)).on_frame(on_frame);
        animator.run();

        let base = Instant::now();
        for t in [0.0, 0.3, 0.6, 0.9, 1.2] {
            handle.fire(base + secs(t));
        }

        let frames = lock(&frames).clone();
        // Four non-terminal frames (0.9 < 1.0 still delivers) plus the
        // terminal frame carrying the current index.
        assert_eq!(frames.len(), 5);
        for (expected, frame) in frames.iter().take(4).enumerate() {
            assert_eq!(frame.0, expected as u64);
        }
        assert_eq!(frames[4].0, 4);
        assert_eq!(frames[4].1, 1.0);
    }

    #[test]
    fn ticks_after_done_are_ignored() {
        let (dispatcher, handle) = manual_dispatcher();
        let (frames, on_frame) = frame_recorder();

        let animator = Animator::new(&dispatcher, secs(0.5)).on_frame(on_frame);
        animator.run();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(1.0)); // terminal
        handle.fire(base + secs(2.0)); // past the end

        assert_eq!(lock(&frames).len(), 2);
        assert_eq!(animator.state(), State::Done);
    }

    #[test]
    fn progress_accessor_tracks_the_last_frame() {
        let (dispatcher, handle) = manual_dispatcher();
        let animator = Animator::new(&dispatcher, secs(1.0));
        animator.run();

        assert_eq!(animator.progress(), Progress::ZERO);

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(0.4));

        let p = animator.progress();
        assert_eq!(p.index, 1);
        assert!((p.fraction - 0.4).abs() < 1e-9);
    }

    // ── idempotent guards ─────────────────────────────────────────────────

    #[test]
    fn run_is_a_no_op_unless_ready() {
        let (dispatcher, handle) = manual_dispatcher();
        let animator = Animator::new(&dispatcher, secs(1.0));

        animator.run();
        animator.run(); // second call ignored
        assert_eq!(dispatcher.listener_count(), 1);

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(2.0));
        assert_eq!(animator.state(), State::Done);

        animator.run(); // terminal state: still ignored
        assert_eq!(animator.state(), State::Done);
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn cancel_before_run_is_a_no_op() {
        let (dispatcher, _handle) = manual_dispatcher();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(1.0)).on_complete(on_complete);
        animator.cancel();

        assert_eq!(animator.state(), State::Ready);
        assert!(lock(&completions).is_empty());
    }

    // ── cancellation ──────────────────────────────────────────────────────

    #[test]
    fn cancel_before_any_tick_fires_no_callbacks() {
        let (dispatcher, handle) = manual_dispatcher();
        let (frames, on_frame) = frame_recorder();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(1.0))
            .on_frame(on_frame)
            .on_complete(on_complete);
        animator.run();
        animator.cancel();

        assert_eq!(animator.state(), State::Cancelled);
        assert!(lock(&frames).is_empty());
        assert!(lock(&completions).is_empty());
        assert_eq!(dispatcher.listener_count(), 0);

        // A tick arriving after the cancel is ignored.
        handle.fire_now();
        assert!(lock(&frames).is_empty());
    }

    #[test]
    fn cancel_after_frames_completes_false_exactly_once() {
        let (dispatcher, handle) = manual_dispatcher();
        let (frames, on_frame) = frame_recorder();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(5.0))
            .on_frame(on_frame)
            .on_complete(on_complete);
        animator.run();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(1.0));

        animator.cancel();
        animator.cancel(); // second cancel: no-op

        assert_eq!(animator.state(), State::Cancelled);
        assert_eq!(lock(&frames).len(), 2);
        assert_eq!(*lock(&completions), vec![false]);
        assert_eq!(dispatcher.listener_count(), 0);

        handle.fire(base + secs(2.0));
        assert_eq!(lock(&frames).len(), 2);
    }

    #[test]
    fn cancel_after_done_is_a_no_op() {
        let (dispatcher, handle) = manual_dispatcher();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(0.1)).on_complete(on_complete);
        animator.run();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(1.0));
        assert_eq!(animator.state(), State::Done);

        animator.cancel();
        assert_eq!(animator.state(), State::Done);
        assert_eq!(*lock(&completions), vec![true]);
    }

    #[test]
    fn cancel_from_within_the_frame_callback_is_safe() {
        let (dispatcher, handle) = manual_dispatcher();
        let (completions, on_complete) = completion_recorder();

        let slot: Arc<Mutex<Option<Arc<Animator>>>> = Arc::new(Mutex::new(None));
        let trigger = Arc::clone(&slot);

        let animator = Arc::new(
            Animator::new(&dispatcher, secs(10.0))
                .on_frame(move |p| {
                    if p.index >= 1 {
                        if let Some(animator) = lock(&trigger).as_ref() {
                            animator.cancel();
                        }
                    }
                })
                .on_complete(on_complete),
        );
        *lock(&slot) = Some(Arc::clone(&animator));
        animator.run();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(0.1)); // frame 1 cancels from inside

        assert_eq!(animator.state(), State::Cancelled);
        assert_eq!(*lock(&completions), vec![false]);
        assert_eq!(dispatcher.listener_count(), 0);

        drop(lock(&slot).take());
    }

    // ── shared dispatcher & resource lifetime ─────────────────────────────

    #[test]
    fn cancelling_one_animator_leaves_the_other_untouched() {
        let (dispatcher, handle) = manual_dispatcher();
        let (short_frames, short_on_frame) = frame_recorder();
        let (long_frames, long_on_frame) = frame_recorder();

        let short = Animator::new(&dispatcher, secs(2.0)).on_frame(short_on_frame);
        let long = Animator::new(&dispatcher, secs(5.0)).on_frame(long_on_frame);
        short.run();
        long.run();

        let base = Instant::now();
        handle.fire(base);
        handle.fire(base + secs(0.5));
        handle.fire(base + secs(1.0));

        short.cancel();

        handle.fire(base + secs(1.5));
        handle.fire(base + secs(2.0));

        assert_eq!(lock(&short_frames).len(), 3);

        let long_frames = lock(&long_frames).clone();
        assert_eq!(long_frames.len(), 5);
        for (expected, frame) in long_frames.iter().enumerate() {
            assert_eq!(frame.0, expected as u64);
            assert!((frame.1 - expected as f64 * 0.1).abs() < 1e-9);
        }
    }

    #[test]
    fn dropping_a_running_animator_removes_its_listener() {
        let (dispatcher, handle) = manual_dispatcher();
        let (completions, on_complete) = completion_recorder();

        let animator = Animator::new(&dispatcher, secs(10.0)).on_complete(on_complete);
        animator.run();
        handle.fire_now();
        assert_eq!(dispatcher.listener_count(), 1);

        drop(animator);
        assert_eq!(dispatcher.listener_count(), 0);
        // Drop fires no callbacks.
        assert!(lock(&completions).is_empty());
    }

    // ── identity ──────────────────────────────────────────────────────────

    #[test]
    fn equality_is_by_identity_not_state() {
        let (dispatcher, handle) = manual_dispatcher();

        let a = Animator::new(&dispatcher, secs(1.0));
        let b = Animator::new(&dispatcher, secs(1.0));
        assert_ne!(a, b);
        assert_eq!(a, a);

        // State changes do not affect identity.
        a.run();
        handle.fire_now();
        assert_eq!(a, a);
        assert_ne!(a, b);
    }

    #[test]
    fn state_terminality() {
        assert!(!State::Ready.is_terminal());
        assert!(!State::Running.is_terminal());
        assert!(State::Done.is_terminal());
        assert!(State::Cancelled.is_terminal());
    }
}
