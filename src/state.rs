use serde::Serialize;

use crate::status::Status;

/// A snapshot of a tracked operation
///
/// The `data` and `error` fields hold the outcome of the last settled operation. At most one
/// of them is set after a settlement: resolving clears the error and rejecting clears the data.
///
/// The `is_*` flags are computed from the status and are never stored on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsyncState<T, E> {
    status: Status,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        AsyncState {
            status: Status::Idle,
            data: None,
            error: None,
        }
    }
}

impl<T, E> AsyncState<T, E> {
    /// Create an idle state holding an initial value
    pub fn with_data(data: T) -> Self {
        AsyncState {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Consume the state returning its fields
    pub fn into_parts(self) -> (Status, Option<T>, Option<E>) {
        (self.status, self.data, self.error)
    }

    pub fn is_idle(&self) -> bool {
        self.status.is_idle()
    }

    /// Returns true while an operation is pending
    pub fn is_loading(&self) -> bool {
        self.status.is_pending()
    }

    pub fn is_error(&self) -> bool {
        self.status.is_rejected()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_resolved()
    }

    pub(crate) fn pending(&mut self) {
        self.status = Status::Pending;
    }

    pub(crate) fn resolve(&mut self, data: T) {
        self.status = Status::Resolved;
        self.data = Some(data);
        self.error = None;
    }

    pub(crate) fn reject(&mut self, error: E) {
        self.status = Status::Rejected;
        self.data = None;
        self.error = Some(error);
    }

    pub(crate) fn reset(&mut self) {
        *self = AsyncState::default();
    }

    pub(crate) fn settle(&mut self, result: Result<T, E>) {
        match result {
            Ok(data) => self.resolve(data),
            Err(error) => self.reject(error),
        }
    }
}
