//! Immutable notification records.

use std::collections::HashSet;

use cachereplay_core::{CallbackId, ClientId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CallbackRecipient, EventCategory, EventId, EventPayload, ItemRemoveReason, SubscriptionMask,
};

/// One notification of a cache mutation.
///
/// Built once, when the originating mutation completes, and never changed
/// afterwards. Fields are private so a recorded notification cannot be
/// edited through a shared handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    id: EventId,
    payload: EventPayload,
    created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(id: EventId, payload: EventPayload) -> Self {
        Self::with_timestamp(id, payload, Utc::now())
    }

    /// Create a record with an explicit creation time.
    pub fn with_timestamp(id: EventId, payload: EventPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            created_at,
        }
    }

    /// Identity used for de-duplication.
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Category of the notification.
    pub fn category(&self) -> EventCategory {
        self.id.category
    }

    /// Notification body.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Affected key (empty for cache-wide events).
    pub fn key(&self) -> &str {
        &self.payload.key
    }

    /// Wall-clock time the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this record should be replayed to `client_id`.
    ///
    /// Broadcast categories follow `mask`. A poll request that names its
    /// subscribers only reaches those clients. Callback categories require a
    /// matching recipient, see [`Self::recipient_for`].
    pub fn is_deliverable_to(
        &self,
        client_id: &ClientId,
        mask: SubscriptionMask,
        callbacks: Option<&HashSet<CallbackId>>,
    ) -> bool {
        let category = self.category();
        if category == EventCategory::PollRequestBroadcast && !self.payload.subscribers.is_empty() {
            return self.names_subscriber(client_id);
        }
        if category.is_broadcast() {
            mask.permits(category)
        } else {
            self.recipient_for(client_id, callbacks).is_some()
        }
    }

    /// Whether `client_id` is one of the payload's subscribers.
    pub fn names_subscriber(&self, client_id: &ClientId) -> bool {
        !client_id.is_empty() && self.payload.subscribers.contains(client_id)
    }

    /// First recipient entry that addresses `client_id`.
    ///
    /// Keyed callbacks (add, update, remove) also need a callback id; when
    /// `callbacks` is given the id must be in it. Expired-item remove
    /// callbacks only reach recipients that asked for expirations. An empty
    /// client id never matches.
    pub fn recipient_for(
        &self,
        client_id: &ClientId,
        callbacks: Option<&HashSet<CallbackId>>,
    ) -> Option<&CallbackRecipient> {
        if client_id.is_empty() || !self.category().is_callback() {
            return None;
        }
        let keyed = self.category().is_keyed_callback();
        let expiration = self.category() == EventCategory::ItemRemovedCallback
            && self.payload.removal_reason == Some(ItemRemoveReason::Expired);

        self.payload.recipients.iter().find(|r| {
            if r.client_id != *client_id {
                return false;
            }
            if expiration && !r.notify_on_expiration {
                return false;
            }
            if !keyed {
                return true;
            }
            match (r.callback_id, callbacks) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(id), Some(wanted)) => wanted.contains(&id),
            }
        })
    }
}
