//! Replay service diagnostics.

use std::time::Duration;

use serde::Serialize;

/// Point-in-time counters for one replay service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStats {
    /// Records currently stored (expired heads may not be swept yet).
    pub retained: usize,
    /// Records appended since construction.
    pub recorded: u64,
    /// Records dropped by window eviction since construction.
    pub evicted: u64,
    /// Retention window in seconds.
    pub window_secs: u64,
    /// Time since construction.
    pub uptime: Duration,
    /// Whether the service has been alive for a full window.
    pub complete: bool,
}
