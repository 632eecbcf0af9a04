//! Error types for the replay subsystem.
//!
//! The replay core is deliberately quiet: the producer path never reports
//! errors, and the consumer path only fails once the owning service has been
//! disposed. [`ReplayError`] covers those cases plus construction-time
//! validation.

use thiserror::Error;

/// Errors surfaced by the replay log and service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The service was disposed and its log discarded.
    #[error("replay service has been disposed")]
    Disposed,

    /// The retention window must be at least one second.
    #[error("invalid retention window: {0}s (must be >= 1)")]
    InvalidWindow(u64),
}

/// Convenience type alias for replay results.
pub type Result<T> = std::result::Result<T, ReplayError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
