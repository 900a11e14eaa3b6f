//! Helpers to control when a tracked computation settles
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;

/// A computation that settles when told to
///
/// Created with [`deferred`], along with the [`Settle`] half that decides its outcome.
/// If the `Settle` half is dropped without being used, the computation never settles.
pub struct Deferred<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

/// The half of a [`Deferred`] computation used to settle it
pub struct Settle<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

/// Create a computation that can be settled manually
///
/// # Example
/// ```rust
/// use async_tracker::testing::deferred;
/// use async_tracker::Tracker;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tracker: Tracker<&str, ()> = Tracker::new();
/// let (computation, settle) = deferred();
///
/// let running = tracker.run(computation);
/// assert!(tracker.is_loading());
///
/// settle.resolve("done");
/// running.await.unwrap();
/// assert_eq!(tracker.data(), Some("done"));
/// # }
/// ```
pub fn deferred<T, E>() -> (Deferred<T, E>, Settle<T, E>) {
    let (tx, rx) = oneshot::channel();
    (Deferred { rx }, Settle { tx })
}

impl<T, E> Settle<T, E> {
    pub fn resolve(self, value: T) {
        self.settle(Ok(value))
    }

    pub fn reject(self, error: E) {
        self.settle(Err(error))
    }

    pub fn settle(self, result: Result<T, E>) {
        // the computation may have been dropped already, in which case
        // there is nobody left to notify
        let _ = self.tx.send(result);
    }
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(self.rx.poll_unpin(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(oneshot::Canceled) => Poll::Pending,
        }
    }
}
