use thiserror::Error;

/// Misuse of the tracker API
///
/// These errors are reported before any state transition happens. Failures of the tracked
/// computation are never reported through this type, they become part of the tracker state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("The argument passed to run must be a promise. Maybe a function that's passed isn't returning anything?")]
    NotAComputation,

    #[error("run must be called from within a tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, Error>;
