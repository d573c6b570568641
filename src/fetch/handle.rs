//! Request lifecycle: the spawned task, its handle and the event channel.
//!
//! Every request runs as its own tokio task. The task races the work against
//! an optional deadline and settles the request exactly once. Settling is a
//! compare-and-set on the shared state: the first terminal state wins, and
//! the event sender is taken at that moment, so nothing can be emitted after
//! the outcome. Cancellation settles `Cancelled` first and then aborts the
//! task, which drops the in-flight transport future.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::UsageError;
use super::outcome::{FetchEvent, Outcome, RequestState};
use super::progress::ProgressEvent;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

struct Inner<P> {
    state: RequestState,
    events: Option<UnboundedSender<FetchEvent<P>>>,
    task: Option<AbortHandle>,
}

struct Shared<P> {
    id: RequestId,
    inner: Mutex<Inner<P>>,
}

impl<P> Shared<P> {
    fn new(events: UnboundedSender<FetchEvent<P>>) -> Self {
        Self {
            id: RequestId::next(),
            inner: Mutex::new(Inner {
                state: RequestState::InFlight,
                events: Some(events),
                task: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> RequestState {
        self.lock().state
    }

    fn progress(&self, event: ProgressEvent) -> bool {
        let inner = self.lock();
        match &inner.events {
            Some(events) => events.send(FetchEvent::Progress(event)).is_ok(),
            None => false,
        }
    }

    /// Moves the request to its terminal state. Returns false if it had
    /// already settled.
    fn settle(&self, outcome: Outcome<P>) -> bool {
        let state = outcome.state();
        {
            let mut inner = self.lock();
            if inner.state.is_terminal() {
                return false;
            }
            inner.state = state;
            if let Some(events) = inner.events.take() {
                // A dropped receiver just means nobody is listening.
                let _ = events.send(FetchEvent::Finished(outcome));
            }
        }
        match state {
            RequestState::NetworkError => warn!(request_id = %self.id, %state, "request settled"),
            _ => debug!(request_id = %self.id, %state, "request settled"),
        }
        true
    }

    fn cancel(&self) -> bool {
        if !self.settle(Outcome::Cancelled) {
            return false;
        }
        if let Some(task) = self.lock().task.take() {
            task.abort();
        }
        true
    }
}

/// Type-erased view of a request used by [`Canceller`].
trait Control: Send + Sync {
    fn id(&self) -> RequestId;
    fn state(&self) -> RequestState;
    fn cancel(&self) -> bool;
}

impl<P: Send> Control for Shared<P> {
    fn id(&self) -> RequestId {
        self.id
    }

    fn state(&self) -> RequestState {
        Shared::state(self)
    }

    fn cancel(&self) -> bool {
        Shared::cancel(self)
    }
}

/// Cloneable cancel capability split off a [`RequestHandle`].
///
/// Useful when the handle is being awaited in one place (say, a UI loop) and
/// cancellation is triggered from another (a signal handler).
#[derive(Clone)]
pub struct Canceller {
    control: Arc<dyn Control>,
}

impl Canceller {
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.control.id()
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.control.state()
    }

    /// Cancels the request. Returns false if it had already settled.
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Write side of a request, handed to the work future.
pub(crate) struct Reporter<P> {
    shared: Arc<Shared<P>>,
}

impl<P> Reporter<P> {
    /// Emits a progress event. Returns false once the request has settled,
    /// in which case the caller should stop producing work.
    pub(crate) fn progress(&self, event: ProgressEvent) -> bool {
        self.shared.progress(event)
    }

    pub(crate) fn id(&self) -> RequestId {
        self.shared.id
    }
}

/// Settles `NetworkError` if the task is torn down without having settled,
/// which happens when the work future panics or the runtime shuts down.
struct SettleOnDrop<P> {
    shared: Arc<Shared<P>>,
}

impl<P> Drop for SettleOnDrop<P> {
    fn drop(&mut self) {
        self.shared.settle(Outcome::NetworkError {
            message: "request task ended unexpectedly".to_string(),
        });
    }
}

/// Handle to an in-flight request.
///
/// Events are delivered in order on a private channel: zero or more
/// [`FetchEvent::Progress`] followed by exactly one
/// [`FetchEvent::Finished`]. Dropping the handle cancels the request; keep
/// it alive (or await [`RequestHandle::outcome`]) for as long as the result
/// matters.
pub struct RequestHandle<P> {
    shared: Arc<Shared<P>>,
    events: UnboundedReceiver<FetchEvent<P>>,
}

impl<P: Send + 'static> RequestHandle<P> {
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.shared.id
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.shared.state()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Cancels the request. Returns false if it had already settled, in
    /// which case this is a no-op.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Returns a cloneable cancel capability for this request.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller {
            control: Arc::clone(&self.shared) as Arc<dyn Control>,
        }
    }

    /// Waits for the next event. Returns `None` after the outcome has been
    /// delivered.
    pub async fn next_event(&mut self) -> Option<FetchEvent<P>> {
        self.events.recv().await
    }

    /// Waits for the outcome, discarding progress events.
    pub async fn outcome(mut self) -> Outcome<P> {
        while let Some(event) = self.events.recv().await {
            if let FetchEvent::Finished(outcome) = event {
                return outcome;
            }
        }
        Outcome::NetworkError {
            message: "request ended without an outcome".to_string(),
        }
    }

    /// Drives the request to completion, invoking `on_progress` for every
    /// progress event and `on_outcome` exactly once at the end.
    pub async fn drive<FP, FO>(mut self, mut on_progress: FP, on_outcome: FO) -> Outcome<P>
    where
        FP: FnMut(&ProgressEvent),
        FO: FnOnce(&Outcome<P>),
    {
        let outcome = loop {
            match self.events.recv().await {
                Some(FetchEvent::Progress(event)) => on_progress(&event),
                Some(FetchEvent::Finished(outcome)) => break outcome,
                None => {
                    break Outcome::NetworkError {
                        message: "request ended without an outcome".to_string(),
                    };
                }
            }
        };
        on_outcome(&outcome);
        outcome
    }
}

impl<P> Drop for RequestHandle<P> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

impl<P> fmt::Debug for RequestHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.shared.id)
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

/// Spawns a request task on the current tokio runtime.
///
/// The deadline is fixed here, at call time. `work` builds the future that
/// performs the transfer; it receives a [`Reporter`] for progress events.
/// When the deadline passes first the work future is dropped and the request
/// settles `TimedOut`.
pub(crate) fn spawn_lifecycle<P, F, Fut>(
    timeout: Option<Duration>,
    work: F,
) -> Result<RequestHandle<P>, UsageError>
where
    P: Send + 'static,
    F: FnOnce(Reporter<P>) -> Fut,
    Fut: Future<Output = Outcome<P>> + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| UsageError::NoRuntime)?;
    let deadline = timeout.map(|timeout| Instant::now() + timeout);

    let (sender, receiver) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::new(sender));
    let work = work(Reporter {
        shared: Arc::clone(&shared),
    });
    let guard = SettleOnDrop {
        shared: Arc::clone(&shared),
    };

    debug!(request_id = %shared.id, ?timeout, "request started");
    let task = runtime.spawn(async move {
        let outcome = match deadline {
            Some(deadline) => {
                tokio::select! {
                    outcome = work => outcome,
                    () = tokio::time::sleep_until(deadline) => Outcome::TimedOut,
                }
            }
            None => work.await,
        };
        guard.shared.settle(outcome);
    });

    {
        let mut inner = shared.lock();
        if !inner.state.is_terminal() {
            inner.task = Some(task.abort_handle());
        }
    }

    Ok(RequestHandle {
        shared,
        events: receiver,
    })
}
