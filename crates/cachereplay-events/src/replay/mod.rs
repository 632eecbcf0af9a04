//! Notification replay: the service façade over one [`EventLog`] of
//! [`EventRecord`]s, its request type, diagnostics and background sweep.
//!
//! [`EventLog`]: crate::log::EventLog
//! [`EventRecord`]: crate::types::EventRecord

mod request;
mod service;
mod stats;
mod sweeper;

pub use request::ReplayRequest;
pub use service::NotificationReplayService;
pub use stats::ReplayStats;
pub use sweeper::run_sweeper;
