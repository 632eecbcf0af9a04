//! Per-client broadcast subscriptions.

use serde::{Deserialize, Serialize};

use super::EventCategory;

/// Which broadcast categories a client wants.
///
/// Supplied by the caller on every replay request, derived from the
/// client's live event registrations. The replay service never stores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionMask {
    /// Wants `CacheClearedBroadcast`.
    pub cache_cleared: bool,
    /// Wants `ItemAddedBroadcast`.
    pub item_added: bool,
    /// Wants `ItemRemovedBroadcast`.
    pub item_removed: bool,
    /// Wants `ItemUpdatedBroadcast`.
    pub item_updated: bool,
}

impl SubscriptionMask {
    /// Subscribed to nothing.
    pub const fn none() -> Self {
        Self {
            cache_cleared: false,
            item_added: false,
            item_removed: false,
            item_updated: false,
        }
    }

    /// Subscribed to every broadcast category.
    pub const fn all() -> Self {
        Self {
            cache_cleared: true,
            item_added: true,
            item_removed: true,
            item_updated: true,
        }
    }

    /// Derive a mask from how many handlers a client has registered per kind.
    pub fn from_registrations(added: usize, updated: usize, removed: usize, cleared: usize) -> Self {
        Self {
            cache_cleared: cleared > 0,
            item_added: added > 0,
            item_removed: removed > 0,
            item_updated: updated > 0,
        }
    }

    /// Set the cache-cleared flag.
    #[must_use]
    pub fn with_cache_cleared(mut self, yes: bool) -> Self {
        self.cache_cleared = yes;
        self
    }

    /// Set the item-added flag.
    #[must_use]
    pub fn with_item_added(mut self, yes: bool) -> Self {
        self.item_added = yes;
        self
    }

    /// Set the item-removed flag.
    #[must_use]
    pub fn with_item_removed(mut self, yes: bool) -> Self {
        self.item_removed = yes;
        self
    }

    /// Set the item-updated flag.
    #[must_use]
    pub fn with_item_updated(mut self, yes: bool) -> Self {
        self.item_updated = yes;
        self
    }

    /// Whether a broadcast of `category` may be replayed.
    ///
    /// Poll requests are not gated by a flag; when they name subscribers the
    /// record itself narrows delivery, see
    /// [`EventRecord::is_deliverable_to`](crate::types::EventRecord::is_deliverable_to).
    /// Callback categories are never permitted here (they go by recipient
    /// list instead).
    pub fn permits(self, category: EventCategory) -> bool {
        match category {
            EventCategory::CacheClearedBroadcast => self.cache_cleared,
            EventCategory::ItemAddedBroadcast => self.item_added,
            EventCategory::ItemRemovedBroadcast => self.item_removed,
            EventCategory::ItemUpdatedBroadcast => self.item_updated,
            EventCategory::PollRequestBroadcast => true,
            EventCategory::ItemAddedCallback
            | EventCategory::ItemUpdatedCallback
            | EventCategory::ItemRemovedCallback
            | EventCategory::ContinuousQueryCallback
            | EventCategory::TaskCallback => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_flag_gates_its_category() {
        let cases = [
            (SubscriptionMask::none().with_cache_cleared(true), EventCategory::CacheClearedBroadcast),
            (SubscriptionMask::none().with_item_added(true), EventCategory::ItemAddedBroadcast),
            (SubscriptionMask::none().with_item_removed(true), EventCategory::ItemRemovedBroadcast),
            (SubscriptionMask::none().with_item_updated(true), EventCategory::ItemUpdatedBroadcast),
        ];
        for (mask, category) in cases {
            assert!(mask.permits(category), "{category}");
            let others = EventCategory::ALL
                .iter()
                .filter(|c| **c != category && **c != EventCategory::PollRequestBroadcast);
            for other in others {
                assert!(!mask.permits(*other), "{category} mask let {other} through");
            }
        }
    }

    #[test]
    fn poll_requests_not_gated_by_mask() {
        assert!(SubscriptionMask::none().permits(EventCategory::PollRequestBroadcast));
    }

    #[test]
    fn callbacks_never_permitted_by_mask() {
        for c in EventCategory::ALL.into_iter().filter(|c| c.is_callback()) {
            assert!(!SubscriptionMask::all().permits(c), "{c}");
        }
    }

    #[test]
    fn from_registrations() {
        let mask = SubscriptionMask::from_registrations(2, 0, 1, 0);
        assert_eq!(
            mask,
            SubscriptionMask::none()
                .with_item_added(true)
                .with_item_removed(true)
        );
        assert_eq!(SubscriptionMask::default(), SubscriptionMask::none());
    }

    #[test]
    fn json_shape() {
        let mask: SubscriptionMask = serde_json::from_str(r#"{"itemAdded": true}"#).unwrap();
        assert!(mask.item_added);
        assert!(!mask.cache_cleared);
    }
}
