//! Metric name constants to avoid typos across crates.
//!
//! Recording goes through the `metrics` facade; installing an exporter is the
//! embedding process's job.

/// Notification records appended to a replay log (counter, labels: category).
pub const REPLAY_EVENTS_RECORDED_TOTAL: &str = "replay_events_recorded_total";
/// Records dropped from the head of a replay log (counter).
pub const REPLAY_EVENTS_EVICTED_TOTAL: &str = "replay_events_evicted_total";
/// Records that arrived after the service was disposed (counter).
pub const REPLAY_EVENTS_DROPPED_TOTAL: &str = "replay_events_dropped_total";
/// Filtered replay requests served (counter).
pub const REPLAY_REQUESTS_TOTAL: &str = "replay_requests_total";
/// Records returned across all replay requests (counter).
pub const REPLAY_EVENTS_RETURNED_TOTAL: &str = "replay_events_returned_total";
/// Records currently retained in the window (gauge).
pub const REPLAY_WINDOW_LEN: &str = "replay_window_len";
