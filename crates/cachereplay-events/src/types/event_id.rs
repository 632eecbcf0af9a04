//! Event identity used for replay de-duplication.

use std::fmt;

use cachereplay_core::NodeId;
use serde::{Deserialize, Serialize};

use super::EventCategory;

/// Identity of one notification.
///
/// A node stamps every notification with its own unique id, the counter of
/// the cache operation that caused it, and a counter for events raised
/// within that operation. The category is part of the identity: one
/// operation can raise both an update broadcast and an update callback.
///
/// Clients echo these ids back as their already-consumed set, so equality
/// and hashing cover every field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    /// Node that raised the notification.
    pub unique_id: NodeId,
    /// Counter of the originating cache operation.
    pub operation_counter: i64,
    /// Counter of the event within that operation.
    pub event_counter: i32,
    /// What kind of notification this is.
    pub category: EventCategory,
}

impl EventId {
    /// Create an id from its parts.
    pub fn new(
        unique_id: impl Into<NodeId>,
        operation_counter: i64,
        event_counter: i32,
        category: EventCategory,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            operation_counter,
            event_counter,
            category,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.unique_id, self.operation_counter, self.event_counter, self.category
        )
    }
}
