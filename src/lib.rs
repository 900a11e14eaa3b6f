//! Track the lifecycle of an asynchronous operation.
//!
//! A [`Tracker`] wraps a computation in a small state machine. The state starts
//! [idle](Status::Idle), becomes [pending](Status::Pending) as soon as a computation is
//! [run](Tracker::run), and ends up [resolved](Status::Resolved) with the produced value or
//! [rejected](Status::Rejected) with the failure once the computation settles.
//!
//! ```rust
//! use async_tracker::{Status, Tracker};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tracker: Tracker<String, String> = Tracker::with_data("cached".to_string());
//!
//! let running = tracker.run(async { Err("not found".to_string()) });
//! assert_eq!(tracker.status(), Status::Pending);
//!
//! // failures of the computation are part of the state
//! assert!(running.await.is_err());
//! assert!(tracker.is_error());
//! assert_eq!(tracker.data(), None);
//! assert_eq!(tracker.error(), Some("not found".to_string()));
//!
//! tracker.reset();
//! assert!(tracker.is_idle());
//! # }
//! ```
//!
//! # Teardown
//!
//! The tracker is meant to be owned by a scope with a lifecycle of its own, for instance a UI
//! component. When that scope goes away it calls [`Tracker::teardown`], or just drops the
//! tracker. From that point on the state stays as it is: computations still in flight complete
//! normally and their result is still returned to whoever awaits them, but the tracker silently
//! ignores them.
//!
//! # Logging
//!
//! State transitions are reported through [`tracing`] at the `debug` level. Enable the `logging`
//! feature to get `init_logging`, which installs a formatter controlled by `RUST_LOG`.
mod error;
mod running;
mod state;
mod status;
mod teardown;
mod tracker;

pub mod testing;

#[cfg(feature = "logging")]
mod logging;

#[cfg(feature = "logging")]
pub use logging::init as init_logging;

pub use error::{Error, Result};
pub use running::Running;
pub use state::AsyncState;
pub use status::Status;
pub use teardown::{AutoTeardown, Teardown};
pub use tracker::{Opts, Tracker, Tracking};
