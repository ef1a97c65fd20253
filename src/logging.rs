//! # Logging
//!
//! Structured logging bootstrap for embedding runtimes. Filtering comes
//! from `KILN_LOG` (standard `tracing` directive syntax, `info` when
//! unset); output is human-readable lines or JSON depending on
//! configuration.

use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls and an already-installed subscriber are both no-ops.
pub fn init_logging(log_json: bool) {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env("KILN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

        if log_json {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_target(true))
                .try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true))
                .try_init();
        }
    });
}
