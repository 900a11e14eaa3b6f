use std::sync::Once;

use tracing_subscriber::{prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Print tracker events to stderr
///
/// Verbosity is controlled with the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=async_tracker=debug` reports every state transition. Calling
/// this more than once, or after a global subscriber was set, has no effect.
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(EnvFilter::from_default_env())
            .try_init()
            .unwrap_or(())
    });
}
