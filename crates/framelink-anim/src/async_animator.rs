//! Bounded-duration animator with suspending callbacks.
//!
//! [`AsyncAnimator`] mirrors [`Animator`](crate::Animator) but lets the
//! frame and completion callbacks return futures, driven on a tokio
//! runtime. Because a frame future may outlive the tick interval, each
//! animator keeps at most one frame invocation in flight: a tick arriving
//! while the previous frame future is unresolved is dropped for that
//! animator, never queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use framelink_core::dispatch::{FrameDispatcher, ListenId};
use tokio::runtime::Handle;

use crate::animator::{State, next_identity};
use crate::lock;
use crate::progress::Progress;

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type FrameFn = Arc<dyn Fn(Progress) -> BoxedFuture + Send + Sync>;
type CompleteFn = Arc<dyn Fn(bool) -> BoxedFuture + Send + Sync>;

/// Suspending-callback animator.
///
/// Equality is by construction-time identity, as for `Animator`.
pub struct AsyncAnimator {
    identity: u64,
    inner: Arc<Mutex<Inner>>,
    in_flight: Arc<AtomicBool>,
}

struct Inner {
    dispatcher: FrameDispatcher,
    duration: Duration,
    state: State,
    origin: Option<Instant>,
    index: u64,
    progress: Progress,
    on_frame: Option<FrameFn>,
    on_complete: Option<CompleteFn>,
    listen: Option<ListenId>,
    runtime: Option<Handle>,
}

impl AsyncAnimator {
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
                runtime: None,
            })),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the per-frame callback. Ignored once the animator has run.
    #[must_use]
    pub fn on_frame<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Progress) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        {
            let mut inner = lock(&self.inner);
            if inner.state == State::Ready {
                inner.on_frame = Some(Arc::new(move |p| -> BoxedFuture { Box::pin(f(p)) }));
            }
        }
        self
    }

    /// Sets the completion callback, invoked at most once with `true` on
    /// natural completion or `false` on cancellation. Ignored once the
    /// animator has run.
    #[must_use]
    pub fn on_complete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(bool) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        {
            let mut inner = lock(&self.inner);
            if inner.state == State::Ready {
                inner.on_complete = Some(Arc::new(move |finished| -> BoxedFuture {
                    Box::pin(f(finished))
                }));
            }
        }
        self
    }

    /// Starts the run on the ambient tokio runtime.
    ///
    /// Outside a runtime this logs a warning and leaves the animator
    /// `Ready` (degenerate-but-valid, matching the never-ticks dispatcher
    /// policy).
    pub fn run(&self) {
        match Handle::try_current() {
            Ok(runtime) => self.run_on(runtime),
            Err(_) => {
                log::warn!("AsyncAnimator::run called outside a tokio runtime; not started");
            }
        }
    }

    /// Starts the run, spawning frame futures on `runtime`.
    /// No-op unless `Ready`.
    pub fn run_on(&self, runtime: Handle) {
        {
            let mut inner = lock(&self.inner);
            if inner.state != State::Ready {
                return;
            }
            inner.state = State::Running;
            inner.runtime = Some(runtime);
        }

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let in_flight = Arc::clone(&self.in_flight);
        let dispatcher = lock(&self.inner).dispatcher.clone();
        let id = dispatcher.listen(move |tick| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // At most one frame invocation in flight per animator: a tick
            // arriving while the previous frame future is unresolved is
            // dropped, not queued.
            if in_flight.swap(true, Ordering::AcqRel) {
                return;
            }
            let runtime = lock(&inner).runtime.clone();
            let Some(runtime) = runtime else {
                in_flight.store(false, Ordering::Release);
                return;
            };
            let flag = Arc::clone(&in_flight);
            runtime.spawn(async move {
                drive(inner, tick.at).await;
                flag.store(false, Ordering::Release);
            });
        });

        let mut inner = lock(&self.inner);
        if inner.state == State::Running {
            inner.listen = Some(id);
        } else {
            drop(inner);
            dispatcher.unlisten(id);
        }
    }

    /// Cancels a running animation. No-op unless `Running`.
    ///
    /// Synchronous: the state flips and the listener is removed before
    /// this returns; the completion future (with `false`) is spawned on
    /// the run's runtime. As for `Animator`, a cancel before any delivered
    /// frame fires neither callback.
    pub fn cancel(&self) {
        let (on_complete, runtime, unlisten) = {
            let mut inner = lock(&self.inner);
            if inner.state != State::Running {
                return;
            }
            inner.state = State::Cancelled;
            let on_complete = if inner.origin.is_some() {
                inner.on_complete.take()
            } else {
                None
            };
            (
                on_complete,
                inner.runtime.clone(),
                inner.listen.take().map(|id| (inner.dispatcher.clone(), id)),
            )
        };

        if let (Some(f), Some(runtime)) = (on_complete, runtime) {
            runtime.spawn(f(false));
        }
        if let Some((dispatcher, id)) = unlisten {
            dispatcher.unlisten(id);
        }
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

impl std::fmt::Debug for AsyncAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncAnimator")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for AsyncAnimator {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for AsyncAnimator {}

impl Drop for AsyncAnimator {
    fn drop(&mut self) {
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

/// Per-tick step. Locks are never held across an await point.
async fn drive(inner: Arc<Mutex<Inner>>, at: Instant) {
    let (on_frame, progress, finished) = {
        let mut st = lock(&inner);
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
        f(progress).await;
    }

    if finished {
        let (on_complete, unlisten) = {
            let mut st = lock(&inner);
            if st.state != State::Running {
                return; // cancelled from inside the frame future
            }
            st.state = State::Done;
            (
                st.on_complete.take(),
                st.listen.take().map(|id| (st.dispatcher.clone(), id)),
            )
        };
        if let Some(f) = on_complete {
            f(true).await;
        }
        if let Some((dispatcher, id)) = unlisten {
            dispatcher.unlisten(id);
        }
    }
}
