//! Structured logging with `tracing`.
//!
//! The replay crates only emit `tracing` events and spans; installing a
//! subscriber is left to the embedding cache server. [`init_subscriber`] is
//! the default bootstrap, and [`capture_logs`] gives tests an in-memory view
//! of what was emitted.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Output format for [`init_subscriber_with_format`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Initialize the global tracing subscriber with compact stderr output.
///
/// Call once at startup. Subsequent calls are no-ops. `RUST_LOG` takes
/// precedence over `level` when set.
pub fn init_subscriber(level: &str) {
    init_subscriber_with_format(level, LogFormat::Compact);
}

/// Initialize the global tracing subscriber with the given output format.
pub fn init_subscriber_with_format(level: &str, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init fails if a global subscriber is already set
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
