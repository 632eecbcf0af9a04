//! Replay request parameters.

use std::collections::HashSet;

use cachereplay_core::{CallbackId, ClientId};
use serde::{Deserialize, Serialize};

use crate::types::{EventId, SubscriptionMask};

/// What a reconnecting or polling client asks to have replayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    /// Client asking for replay.
    pub client_id: ClientId,
    /// Ids the client has already consumed.
    #[serde(default)]
    pub already_seen: HashSet<EventId>,
    /// Broadcast categories the client currently subscribes to.
    #[serde(default)]
    pub mask: SubscriptionMask,
    /// Restrict keyed callbacks to these callback ids. `None` accepts any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<HashSet<CallbackId>>,
}

impl ReplayRequest {
    /// Request for `client_id` with nothing seen yet.
    pub fn new(client_id: impl Into<ClientId>, mask: SubscriptionMask) -> Self {
        Self {
            client_id: client_id.into(),
            already_seen: HashSet::new(),
            mask,
            callbacks: None,
        }
    }

    /// Mark `ids` as already consumed.
    #[must_use]
    pub fn with_already_seen<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = EventId>,
    {
        self.already_seen.extend(ids);
        self
    }

    /// Narrow keyed callbacks to `ids`.
    #[must_use]
    pub fn with_callbacks<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = CallbackId>,
    {
        self.callbacks
            .get_or_insert_with(HashSet::new)
            .extend(ids);
        self
    }
}
