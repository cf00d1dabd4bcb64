//! Fire-and-forget animation loop.
//!
//! [`Animation`] is the lightweight sibling of
//! [`Animator`](crate::Animator): it starts on construction, drives its
//! frame callback with non-terminal progress every tick, and on reaching
//! the duration unregisters and invokes the completion callback — without
//! a final clamped frame and without an inspectable state machine. Use it
//! when the caller does not need cancellation or progress queries.

use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use framelink_core::dispatch::{FrameDispatcher, ListenId};

use crate::lock;
use crate::progress::Progress;

type FrameFn = Arc<dyn Fn(Progress) + Send + Sync>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// Guard for a running fire-and-forget animation.
///
/// Dropping the guard stops the loop and removes the listener entry; the
/// completion callback does not fire in that case.
pub struct Animation {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    dispatcher: FrameDispatcher,
    duration: Duration,
    origin: Option<Instant>,
    index: u64,
    done: bool,
    on_frame: FrameFn,
    on_complete: Option<CompleteFn>,
    listen: Option<ListenId>,
}

impl Animation {
    /// Starts a loop of `duration` against `dispatcher`.
    ///
    /// `on_frame` receives non-terminal progress once per tick;
    /// `on_complete` fires exactly once when the duration elapses, as long
    /// as the returned guard is still alive.
    pub fn run(
        dispatcher: &FrameDispatcher,
        duration: Duration,
        on_frame: impl Fn(Progress) + Send + Sync + 'static,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Animation {
        let inner = Arc::new(Mutex::new(Inner {
            dispatcher: dispatcher.clone(),
            duration,
            origin: None,
            index: 0,
            done: false,
            on_frame: Arc::new(on_frame),
            on_complete: Some(Box::new(on_complete)),
            listen: None,
        }));

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&inner);
        let id = dispatcher.listen(move |tick| {
            if let Some(inner) = weak.upgrade() {
                drive(&inner, tick.at);
            }
        });
        lock(&inner).listen = Some(id);

        Animation { inner }
    }
}

impl Drop for Animation {
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

fn drive(inner: &Arc<Mutex<Inner>>, at: Instant) {
    enum Step {
        Frame(FrameFn, Progress),
        Complete(Option<CompleteFn>, Option<(FrameDispatcher, ListenId)>),
    }

    let step = {
        let mut st = lock(inner);
        if st.done {
            return;
        }
        let origin = *st.origin.get_or_insert(at);
        let elapsed = at.saturating_duration_since(origin);
        if elapsed >= st.duration {
            st.done = true;
            Step::Complete(
                st.on_complete.take(),
                st.listen.take().map(|id| (st.dispatcher.clone(), id)),
            )
        } else {
            let progress = Progress::at(elapsed, st.duration, st.index);
            st.index += 1;
            Step::Frame(Arc::clone(&st.on_frame), progress)
        }
    };

    // User code runs with the lock released.
    match step {
        Step::Frame(on_frame, progress) => on_frame(progress),
        Step::Complete(on_complete, unlisten) => {
            if let Some(f) = on_complete {
                f();
            }
            if let Some((dispatcher, id)) = unlisten {
                dispatcher.unlisten(id);
            }
        }
    }
}
