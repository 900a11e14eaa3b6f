use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::task::JoinHandle;

/// A handle to a computation started with [`Tracker::run`](crate::Tracker::run)
///
/// Awaiting the handle yields the result of the computation, whether it succeeded
/// or failed. The handle resolves only after the tracker had the chance to record
/// the outcome, meaning the tracker state read right after awaiting already reflects it.
///
/// Dropping the handle does not cancel the computation, it keeps running in the background
/// and the tracker is still updated when it settles.
///
/// # Panics
///
/// If the computation panics, the panic is resumed on the task awaiting the handle.
///
/// Awaiting the handle also panics if the runtime shuts down before the computation
/// settles, as the computation is dropped without producing a result.
#[must_use = "the computation runs in the background, the handle is needed to get its result"]
pub struct Running<T, E> {
    handle: JoinHandle<Result<T, E>>,
}

impl<T, E> Running<T, E> {
    pub(crate) fn new(handle: JoinHandle<Result<T, E>>) -> Self {
        Running { handle }
    }

    /// Returns true if the computation has settled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T, E> Future for Running<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.handle).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            // the handle is never aborted, so this only happens if the
            // runtime shuts down before the computation settles
            Err(err) => panic!("tracked computation did not complete: {err}"),
        }
    }
}
