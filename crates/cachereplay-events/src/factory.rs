//! Record creation for cache-mutation dispatchers.
//!
//! [`EventFactory`] is scoped to one node id and hands out operation
//! counters. Each [`Operation`] numbers the events it raises, so every
//! [`EventRecord`] it builds carries a unique [`EventId`].
//!
//! Recipient lists are copied into the record at creation. Later changes
//! to the live callback registrations never reach a recorded notification.

use std::sync::atomic::{AtomicI64, Ordering};

use cachereplay_core::{ClientId, NodeId};

use crate::types::{
    CallbackRecipient, EventCategory, EventId, EventPayload, EventRecord, ItemRemoveReason,
    ItemValue,
};

/// Scoped record factory for a single cache node.
#[derive(Debug)]
pub struct EventFactory {
    node_id: NodeId,
    operations: AtomicI64,
}

impl EventFactory {
    /// Create a factory for `node_id`.
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            operations: AtomicI64::new(0),
        }
    }

    /// Node id this factory stamps on every record.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Start a new cache operation with the next operation counter.
    pub fn begin(&self) -> Operation<'_> {
        let counter = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        Operation {
            factory: self,
            counter,
            next_event: 0,
        }
    }

    /// `ItemAddedBroadcast` for `key` as its own operation.
    pub fn item_added(&self, key: impl Into<String>, value: ItemValue) -> EventRecord {
        self.begin().event(
            EventCategory::ItemAddedBroadcast,
            EventPayload::for_key(key).with_value(value),
        )
    }

    /// `ItemUpdatedBroadcast` for `key` as its own operation.
    pub fn item_updated(&self, key: impl Into<String>, value: ItemValue) -> EventRecord {
        self.begin().event(
            EventCategory::ItemUpdatedBroadcast,
            EventPayload::for_key(key).with_value(value),
        )
    }

    /// `ItemRemovedBroadcast` for `key` as its own operation.
    pub fn item_removed(
        &self,
        key: impl Into<String>,
        value: ItemValue,
        reason: ItemRemoveReason,
    ) -> EventRecord {
        self.begin().event(
            EventCategory::ItemRemovedBroadcast,
            EventPayload::for_key(key)
                .with_value(value)
                .with_removal_reason(reason),
        )
    }

    /// `CacheClearedBroadcast` as its own operation.
    pub fn cache_cleared(&self) -> EventRecord {
        self.begin()
            .event(EventCategory::CacheClearedBroadcast, EventPayload::cache_wide())
    }

    /// `PollRequestBroadcast` naming the polling clients that should pull.
    pub fn poll_request(&self, clients: &[ClientId]) -> EventRecord {
        self.begin().event(
            EventCategory::PollRequestBroadcast,
            EventPayload::cache_wide().with_subscribers(clients.iter().cloned()),
        )
    }
}

/// One cache operation; numbers the events it raises from zero.
#[derive(Debug)]
pub struct Operation<'a> {
    factory: &'a EventFactory,
    counter: i64,
    next_event: i32,
}

impl Operation<'_> {
    /// Operation counter shared by every record of this operation.
    pub fn counter(&self) -> i64 {
        self.counter
    }

    fn next_id(&mut self, category: EventCategory) -> EventId {
        let id = EventId::new(
            self.factory.node_id.clone(),
            self.counter,
            self.next_event,
            category,
        );
        self.next_event += 1;
        id
    }

    /// Record of any category with a prepared payload.
    pub fn event(&mut self, category: EventCategory, payload: EventPayload) -> EventRecord {
        EventRecord::new(self.next_id(category), payload)
    }

    /// Callback record for `key`, addressed to a copy of `registrations`.
    pub fn callback(
        &mut self,
        category: EventCategory,
        key: impl Into<String>,
        value: ItemValue,
        registrations: &[CallbackRecipient],
    ) -> EventRecord {
        let payload = EventPayload::for_key(key)
            .with_value(value)
            .with_recipients(registrations.iter().cloned());
        self.event(category, payload)
    }

    /// `ItemRemovedCallback` carrying the removal reason.
    pub fn removed_callback(
        &mut self,
        key: impl Into<String>,
        value: ItemValue,
        reason: ItemRemoveReason,
        registrations: &[CallbackRecipient],
    ) -> EventRecord {
        let payload = EventPayload::for_key(key)
            .with_value(value)
            .with_removal_reason(reason)
            .with_recipients(registrations.iter().cloned());
        self.event(EventCategory::ItemRemovedCallback, payload)
    }

    /// `ContinuousQueryCallback` for `key`, one recipient per client.
    pub fn continuous_query(&mut self, key: impl Into<String>, clients: &[ClientId]) -> EventRecord {
        let payload = EventPayload::for_key(key).with_recipients(
            clients
                .iter()
                .map(|c| CallbackRecipient::client(c.clone())),
        );
        self.event(EventCategory::ContinuousQueryCallback, payload)
    }

    /// `TaskCallback` for the client that submitted `task_id`.
    pub fn task(&mut self, task_id: impl Into<String>, client: &ClientId) -> EventRecord {
        let payload =
            EventPayload::for_key(task_id).with_recipients([CallbackRecipient::client(client.clone())]);
        self.event(EventCategory::TaskCallback, payload)
    }
}
