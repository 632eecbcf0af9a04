//! Notification categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of notifiable occurrence.
///
/// Broadcast categories go to every client whose [`SubscriptionMask`]
/// permits them. Callback categories go only to the clients named in the
/// record's recipient list.
///
/// [`SubscriptionMask`]: crate::types::SubscriptionMask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// A registered add callback fired for a key.
    ItemAddedCallback,
    /// A registered update callback fired for a key.
    ItemUpdatedCallback,
    /// A registered remove callback fired for a key.
    ItemRemovedCallback,
    /// An item was added (cache-wide event).
    ItemAddedBroadcast,
    /// An item was removed (cache-wide event).
    ItemRemovedBroadcast,
    /// An item was updated (cache-wide event).
    ItemUpdatedBroadcast,
    /// The whole cache was cleared.
    CacheClearedBroadcast,
    /// A continuous query result set changed.
    ContinuousQueryCallback,
    /// Polling clients should pull pending notifications.
    PollRequestBroadcast,
    /// A submitted task reported progress or completion.
    TaskCallback,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::ItemAddedCallback,
        Self::ItemUpdatedCallback,
        Self::ItemRemovedCallback,
        Self::ItemAddedBroadcast,
        Self::ItemRemovedBroadcast,
        Self::ItemUpdatedBroadcast,
        Self::CacheClearedBroadcast,
        Self::ContinuousQueryCallback,
        Self::PollRequestBroadcast,
        Self::TaskCallback,
    ];

    /// Delivered to every subscribed client.
    pub fn is_broadcast(self) -> bool {
        matches!(
            self,
            Self::ItemAddedBroadcast
                | Self::ItemRemovedBroadcast
                | Self::ItemUpdatedBroadcast
                | Self::CacheClearedBroadcast
                | Self::PollRequestBroadcast
        )
    }

    /// Delivered only to named recipients.
    pub fn is_callback(self) -> bool {
        !self.is_broadcast()
    }

    /// Recipients of this category are identified by client id *and*
    /// callback id. Continuous-query and task callbacks are per client.
    pub fn is_keyed_callback(self) -> bool {
        matches!(
            self,
            Self::ItemAddedCallback | Self::ItemUpdatedCallback | Self::ItemRemovedCallback
        )
    }

    /// Stable snake-case name, used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemAddedCallback => "item_added_callback",
            Self::ItemUpdatedCallback => "item_updated_callback",
            Self::ItemRemovedCallback => "item_removed_callback",
            Self::ItemAddedBroadcast => "item_added_broadcast",
            Self::ItemRemovedBroadcast => "item_removed_broadcast",
            Self::ItemUpdatedBroadcast => "item_updated_broadcast",
            Self::CacheClearedBroadcast => "cache_cleared_broadcast",
            Self::ContinuousQueryCallback => "continuous_query_callback",
            Self::PollRequestBroadcast => "poll_request_broadcast",
            Self::TaskCallback => "task_callback",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
