use std::future::Future;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, span, trace, Instrument, Level};

use crate::error::{Error, Result};
use crate::running::Running;
use crate::state::AsyncState;
use crate::status::Status;
use crate::teardown::{AutoTeardown, Teardown};

/// Which settlements are allowed to update the tracker state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Only the most recent call to `run` is tracked. Computations started
    /// before it still run to completion, but their outcome is ignored
    #[default]
    Latest,
    /// Every computation updates the state when it settles, in the order
    /// they settle
    All,
}

#[derive(Debug, Clone, Default)]
pub struct Opts {
    /// Settlement policy for overlapping runs. Defaults to [`Tracking::Latest`]
    tracking: Tracking,
}

impl Opts {
    pub fn tracking(self, tracking: Tracking) -> Self {
        let mut opts = self;
        opts.tracking = tracking;
        opts
    }
}

struct Shared<T, E> {
    state: watch::Sender<AsyncState<T, E>>,
    generation: AtomicU64,
    teardown: Teardown,
}

impl<T, E> Shared<T, E> {
    /// Apply a change to the state unless the tracker has been torn down
    ///
    /// Subscribers are only notified if the change was applied.
    fn update(&self, action: &'static str, change: impl FnOnce(&mut AsyncState<T, E>)) {
        self.state.send_if_modified(|state| {
            if self.teardown.is_triggered() {
                return false;
            }
            change(state);
            debug!(status = %state.status(), "{action}");
            true
        });
    }

    /// Move to pending and return the generation identifying the new run
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_if_modified(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if self.teardown.is_triggered() {
                return false;
            }
            state.pending();
            debug!(generation, "pending");
            true
        });
        generation
    }

    fn settle(&self, generation: u64, tracking: Tracking, result: std::result::Result<T, E>) {
        self.state.send_if_modified(|state| {
            if self.teardown.is_triggered() {
                return false;
            }

            if tracking == Tracking::Latest
                && self.generation.load(Ordering::SeqCst) != generation
            {
                trace!("superseded by a newer run");
                return false;
            }

            state.settle(result);
            debug!(status = %state.status(), "settled");
            true
        });
    }
}

/// Tracks the lifecycle of an asynchronous operation
///
/// The tracker owns an [`AsyncState`] that starts idle, moves to pending when a computation is
/// [run](Tracker::run), and ends up resolved or rejected when the computation settles.
///
/// Once the tracker is torn down, either explicitly through [`Tracker::teardown`] or by dropping
/// it, its state no longer changes. Computations that are still in flight keep running, but their
/// outcome is discarded without notice.
///
/// # Example
/// ```rust
/// use async_tracker::{Status, Tracker};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tracker: Tracker<i32, String> = Tracker::new();
/// assert!(tracker.is_idle());
///
/// let running = tracker.run(async { Ok(42) });
/// assert!(tracker.is_loading());
///
/// assert_eq!(running.await, Ok(42));
/// assert_eq!(tracker.status(), Status::Resolved);
/// assert_eq!(tracker.data(), Some(42));
/// # }
/// ```
pub struct Tracker<T, E> {
    shared: Arc<Shared<T, E>>,
    opts: Opts,
    teardown: AutoTeardown,
}

impl<T, E> Default for Tracker<T, E> {
    fn default() -> Self {
        Tracker::from_state(AsyncState::default())
    }
}

impl<T, E> Tracker<T, E> {
    pub fn new() -> Self {
        Tracker::default()
    }

    /// Create an idle tracker holding an initial value
    pub fn with_data(data: T) -> Self {
        Tracker::from_state(AsyncState::with_data(data))
    }

    fn from_state(state: AsyncState<T, E>) -> Self {
        let (state, _) = watch::channel(state);
        let teardown = Teardown::new();
        Tracker {
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
                teardown: teardown.clone(),
            }),
            opts: Opts::default(),
            teardown: AutoTeardown::from(teardown),
        }
    }

    /// Replace the tracker options
    ///
    /// Computations that are already running keep the options in effect when they were started.
    pub fn with_opts(self, opts: Opts) -> Self {
        let mut tracker = self;
        tracker.opts = opts;
        tracker
    }

    pub fn status(&self) -> Status {
        self.shared.state.borrow().status()
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }

    /// Returns true while the tracked computation is pending
    pub fn is_loading(&self) -> bool {
        self.status().is_pending()
    }

    pub fn is_error(&self) -> bool {
        self.status().is_rejected()
    }

    pub fn is_success(&self) -> bool {
        self.status().is_resolved()
    }

    /// Reset the tracker to idle, clearing data and error
    pub fn reset(&self) {
        self.shared.update("reset", |state| state.reset());
    }

    /// Resolve the tracker with a value obtained without calling `run`
    ///
    /// This does not affect computations in flight. If one settles afterwards
    /// it will overwrite the value.
    pub fn set_data(&self, data: T) {
        self.shared.update("set_data", |state| state.resolve(data));
    }

    /// Reject the tracker with an error obtained without calling `run`
    pub fn set_error(&self, error: E) {
        self.shared.update("set_error", |state| state.reject(error));
    }

    /// Tear down the tracker
    ///
    /// Every later change to the state is ignored, this includes the settlement of
    /// computations that are still in flight.
    pub fn teardown(&self) {
        self.teardown.trigger();
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_triggered()
    }
}

impl<T: Clone, E: Clone> Tracker<T, E> {
    /// Get a snapshot of the current state
    pub fn state(&self) -> AsyncState<T, E> {
        self.shared.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.shared.state.borrow().data().cloned()
    }

    pub fn error(&self) -> Option<E> {
        self.shared.state.borrow().error().cloned()
    }
}

impl<T, E> Tracker<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Follow changes to the tracker state
    ///
    /// The stream yields the current state first and then a snapshot after every change.
    /// Snapshots may be skipped if the state changes faster than the stream is polled. Ignored
    /// settlements do not produce a new snapshot.
    pub fn subscribe(&self) -> WatchStream<AsyncState<T, E>> {
        WatchStream::new(self.shared.state.subscribe())
    }

    /// Track a computation
    ///
    /// The tracker moves to pending before this method returns, and the computation is spawned
    /// on the current runtime. When the computation settles the tracker moves to resolved or
    /// rejected, unless it was torn down in the meantime or, with [`Tracking::Latest`], a newer
    /// computation was run.
    ///
    /// # Panics
    ///
    /// This function panics if called outside of a tokio runtime. Use [`Tracker::try_run`] to
    /// get an error instead.
    pub fn run<F>(&self, computation: F) -> Running<T, E>
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let generation = self.shared.begin();
        let tracking = self.opts.tracking;
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(
            async move {
                let result = computation.await;
                shared.settle(generation, tracking, result.clone());
                result
            }
            .instrument(span!(Level::DEBUG, "run", generation)),
        );

        Running::new(handle)
    }

    /// Track a computation, checking the call first
    ///
    /// Returns [`Error::NotAComputation`] if no computation is given and [`Error::NoRuntime`] if
    /// called outside of a tokio runtime. The tracker state is not modified in either case.
    pub fn try_run<F>(&self, computation: Option<F>) -> Result<Running<T, E>>
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let computation = computation.ok_or(Error::NotAComputation)?;
        Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(self.run(computation))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::testing::deferred;
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;
    use tokio_test::{assert_pending, task};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};
    use tracing_subscriber::prelude::*;

    struct CountEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for CountEvents {
        fn on_event(&self, _: &Event<'_>, _: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn it_is_pending_before_the_computation_is_polled() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let running = tracker.run(async { Ok(1) });

        // on a current thread runtime the spawned task has not been polled yet
        assert!(tracker.is_loading());
        assert!(!running.is_finished());

        assert_eq!(running.await, Ok(1));
        assert!(tracker.is_success());
    }

    #[tokio::test]
    async fn it_keeps_previous_data_while_pending() {
        let tracker: Tracker<&str, ()> = Tracker::with_data("cached");
        let (computation, settle) = deferred();

        let running = tracker.run(computation);
        assert_eq!(tracker.status(), Status::Pending);
        assert_eq!(tracker.data(), Some("cached"));

        settle.resolve("fresh");
        assert_eq!(running.await, Ok("fresh"));
        assert_eq!(tracker.data(), Some("fresh"));
    }

    #[tokio::test]
    async fn it_ignores_superseded_runs_by_default() {
        let tracker: Tracker<&str, ()> = Tracker::new();
        let (first, settle_first) = deferred();
        let (second, settle_second) = deferred();

        let first = tracker.run(first);
        let second = tracker.run(second);

        settle_second.resolve("second");
        assert_eq!(second.await, Ok("second"));

        settle_first.resolve("first");
        // the result is still forwarded to the caller
        assert_eq!(first.await, Ok("first"));
        assert_eq!(tracker.data(), Some("second"));
    }

    #[tokio::test]
    async fn it_applies_every_settlement_when_tracking_all() {
        let tracker: Tracker<&str, ()> =
            Tracker::new().with_opts(Opts::default().tracking(Tracking::All));
        let (first, settle_first) = deferred();
        let (second, settle_second) = deferred();

        let first = tracker.run(first);
        let second = tracker.run(second);

        settle_second.resolve("second");
        second.await.unwrap();
        settle_first.resolve("first");
        first.await.unwrap();

        assert_eq!(tracker.data(), Some("first"));
    }

    #[tokio::test]
    async fn it_notifies_subscribers_of_changes() {
        let tracker: Tracker<i32, String> = Tracker::new();
        let mut updates = tracker.subscribe();
        assert_eq!(updates.next().await.map(|s| s.status()), Some(Status::Idle));

        let (computation, settle) = deferred();
        let running = tracker.run(computation);
        assert_eq!(
            updates.next().await.map(|s| s.status()),
            Some(Status::Pending)
        );

        settle.reject("boom".to_string());
        assert_eq!(running.await, Err("boom".to_string()));
        let state = updates.next().await.unwrap();
        assert_eq!(state.status(), Status::Rejected);
        assert_eq!(state.error(), Some(&"boom".to_string()));

        tracker.reset();
        assert_eq!(updates.next().await.map(|s| s.status()), Some(Status::Idle));
    }

    #[tokio::test]
    async fn it_does_not_notify_ignored_settlements() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let (computation, settle) = deferred();
        let running = tracker.run(computation);

        let mut updates = tracker.subscribe();
        updates.next().await;

        tracker.teardown();
        settle.resolve(1);
        running.await.unwrap();

        let mut next = task::spawn(updates.next());
        assert_pending!(next.poll());
    }

    #[tokio::test]
    async fn it_emits_no_events_after_teardown() {
        let events = Arc::new(AtomicUsize::new(0));
        let _guard = tracing_subscriber::registry()
            .with(CountEvents(events.clone()))
            .set_default();

        let tracker: Tracker<(), String> = Tracker::new();
        let (ok, resolve) = deferred();
        let (err, reject) = deferred();
        let resolved = tracker.run(ok);
        let rejected = tracker.run(err);
        tracker.teardown();
        let before = events.load(Ordering::SeqCst);

        resolve.resolve(());
        reject.reject("boom".to_string());
        assert_eq!(resolved.await, Ok(()));
        assert_eq!(rejected.await, Err("boom".to_string()));
        tracker.reset();
        tracker.set_data(());

        assert_eq!(events.load(Ordering::SeqCst), before);
        assert!(tracker.is_loading());
    }

    #[tokio::test]
    async fn it_does_not_move_to_pending_after_teardown() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        tracker.teardown();
        assert!(tracker.is_torn_down());

        let running = tracker.run(async { Ok(7) });
        assert!(tracker.is_idle());

        assert_eq!(running.await, Ok(7));
        assert!(tracker.is_idle());
    }

    #[tokio::test]
    async fn it_updates_the_state_after_the_handle_is_dropped() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let mut updates = tracker.subscribe();
        let (computation, settle) = deferred();

        drop(tracker.run(computation));
        assert_eq!(updates.next().await.map(|s| s.status()), Some(Status::Pending));

        settle.resolve(5);
        assert_eq!(updates.next().await.map(|s| s.status()), Some(Status::Resolved));
        assert!(tracker.is_success());
        assert_eq!(tracker.data(), Some(5));
    }

    #[tokio::test]
    async fn it_tears_down_on_drop() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let mut updates = tracker.subscribe();
        let (computation, settle) = deferred();
        let running = tracker.run(computation);
        drop(tracker);

        settle.resolve(1);
        assert_eq!(running.await, Ok(1));

        // only the pending state is seen before the state is dropped
        assert_eq!(updates.next().await.map(|s| s.status()), Some(Status::Pending));
        assert!(updates.next().await.is_none());
    }

    #[test]
    fn it_rejects_missing_computations() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let result = tracker.try_run(None::<std::future::Ready<std::result::Result<i32, ()>>>);

        assert_eq!(result.err(), Some(Error::NotAComputation));
        assert!(tracker.is_idle());
    }

    #[test]
    fn it_rejects_runs_outside_of_a_runtime() {
        let tracker: Tracker<i32, ()> = Tracker::with_data(1);
        tracker.set_error(());
        let result = tracker.try_run(Some(async { Ok(2) }));

        assert_eq!(result.err(), Some(Error::NoRuntime));
        assert!(tracker.is_error());
    }

    fn computation_fails() -> bool {
        true
    }

    #[tokio::test]
    #[should_panic(expected = "computation failed")]
    async fn it_resumes_panics_on_the_caller() {
        let tracker: Tracker<i32, ()> = Tracker::new();
        let running = tracker.run(async {
            if computation_fails() {
                panic!("computation failed");
            }
            Ok(1)
        });
        let _ = running.await;
    }
}
