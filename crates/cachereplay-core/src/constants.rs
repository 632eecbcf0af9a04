//! Package-level constants.

/// Current version of the replay crates (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "cachereplay";

/// Retention window used when none is configured, in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 30;

/// Period of the background eviction sweep, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;
