//! Tracing initialisation for the shipyardd binary.
//!
//! Call [`init_tracing`] once at startup. Respects `RUST_LOG` for
//! fine-grained filtering; falls back to the supplied level otherwise.
//! Subsequent calls are ignored (the global subscriber is set once per
//! process), which keeps tests that initialise logging from panicking.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json` — emit newline-delimited JSON log lines instead of the
///   human-readable format.
/// * `level` — default verbosity when `RUST_LOG` is unset.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}
