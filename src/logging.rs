//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! The reply path runs with a rotated JSON file plus console
//! ([`init_production`]); admin one-shots get a console-only setup
//! ([`init_cli`]) so command output stays readable. Chain logs are a
//! separate artifact (see [`crate::engine::chainlog`]) — the tracing layers
//! here carry operational telemetry only.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset, per mode.
const PRODUCTION_FILTER: &str = "info";
const CLI_FILTER: &str = "warn";

/// Holds the non-blocking writer guard for file logging.
///
/// Must be kept alive for the duration of the process; dropping it flushes
/// pending entries and closes the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Initialise logging for a reply invocation.
///
/// Writes JSON lines to `{logs_dir}/construct.log.YYYY-MM-DD` (daily
/// rotation) and human-readable output to stderr. `RUST_LOG` overrides the
/// default `info` filter for both layers.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "construct.log"));

    tracing_subscriber::registry()
        .with(env_filter(PRODUCTION_FILTER))
        .with(tracing_subscriber::fmt::layer().json().with_writer(file_writer))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise console-only logging for admin subcommands.
///
/// Defaults to `warn` so pipeline telemetry stays out of the way of
/// command output; `RUST_LOG` overrides.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(CLI_FILTER))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}
