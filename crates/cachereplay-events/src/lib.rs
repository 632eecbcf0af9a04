//! # cachereplay-events
//!
//! Notification replay for the distributed cache.
//!
//! Cache mutation paths record every notifiable occurrence (item added,
//! updated or removed, cache cleared, registered callbacks, continuous-query
//! and task callbacks). Reconnecting or polling clients then ask for the
//! records they have not yet consumed, filtered to what they subscribed to.
//!
//! - **Event types**: [`EventCategory`], [`EventId`], [`EventPayload`], [`EventRecord`], [`SubscriptionMask`]
//! - **Event factory**: [`EventFactory`] stamps ids and snapshots recipient lists at creation
//! - **Event log**: [`EventLog`], a generic append-only log that retains the last `W` seconds
//! - **Replay service**: [`NotificationReplayService`], the write/read façade over one log
//!
//! Retention is in time only. A process restart loses the window, and the
//! log has no capacity limit beyond the window: a write burst is bounded
//! only by elapsed time. Callers must treat
//! [`NotificationReplayService::has_complete_data`] returning `false` as
//! "cannot prove completeness yet", not "nothing happened".

pub mod factory;
pub mod log;
pub mod replay;
pub mod types;

pub use cachereplay_core::{ReplayError, Result};
pub use factory::{EventFactory, Operation};
pub use log::EventLog;
pub use replay::{NotificationReplayService, ReplayRequest, ReplayStats};
pub use types::{
    CallbackRecipient, EventCategory, EventDataFilter, EventFlags, EventId, EventPayload,
    EventRecord, ItemRemoveReason, ItemValue, Scalar, SubscriptionMask,
};
