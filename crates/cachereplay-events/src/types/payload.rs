//! Notification payloads.
//!
//! A payload is owned by exactly one record. Recipient and subscriber lists
//! are copied in when the record is built, so later changes to the live
//! callback registrations never show through a recorded notification.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bytes::Bytes;
use cachereplay_core::{CallbackId, ClientId};
use serde::{Deserialize, Serialize};

/// Why an item left the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRemoveReason {
    /// Removed explicitly by a client.
    Removed,
    /// Absolute or sliding expiration elapsed.
    Expired,
    /// Evicted to make room.
    Underused,
    /// A dependency it was tied to changed.
    DependencyChanged,
    /// A dependency it was tied to became invalid.
    DependencyInvalid,
}

/// How much of the item a callback recipient asked to receive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDataFilter {
    /// Key only.
    #[default]
    None,
    /// Key and item metadata.
    Metadata,
    /// Key, metadata and value.
    DataWithMetadata,
}

/// Storage and format flags carried with an item.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFlags(u32);

impl EventFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The item was locked when the event was raised.
    pub const LOCKED_ITEM: Self = Self(1);
    /// The value is compressed.
    pub const COMPRESSED: Self = Self(1 << 1);
    /// The value is a flattened object graph.
    pub const FLATTENED: Self = Self(1 << 2);
    /// The value is raw binary data.
    pub const BINARY_DATA: Self = Self(1 << 3);
    /// The value is JSON.
    pub const JSON_DATA: Self = Self(1 << 4);
    /// The operation was written through to a backing source.
    pub const WRITE_THRU: Self = Self(1 << 5);
    /// The operation is queued for write-behind.
    pub const WRITE_BEHIND: Self = Self(1 << 6);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::LOCKED_ITEM, "LOCKED_ITEM"),
        (Self::COMPRESSED, "COMPRESSED"),
        (Self::FLATTENED, "FLATTENED"),
        (Self::BINARY_DATA, "BINARY_DATA"),
        (Self::JSON_DATA, "JSON_DATA"),
        (Self::WRITE_THRU, "WRITE_THRU"),
        (Self::WRITE_BEHIND, "WRITE_BEHIND"),
    ];

    /// Build from raw bits, keeping unknown bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set every flag in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear every flag in `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for EventFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Debug for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "EventFlags({})", names.join(" | "))
    }
}

/// A single scalar item value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

/// Item value carried by a notification.
///
/// The variants are the shapes a cached value can take, so serializers
/// and filters can match exhaustively instead of inspecting types.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum ItemValue {
    /// No value (key-only notifications and cache-wide events).
    #[default]
    Empty,
    /// A scalar.
    Scalar(Scalar),
    /// One contiguous byte buffer.
    Bytes(Bytes),
    /// A large value split into chunks by the storage layer.
    Chunked(Vec<Bytes>),
    /// A structured document.
    Structured(serde_json::Value),
}

impl ItemValue {
    /// Whether there is no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Size of binary content in bytes; zero for non-binary shapes.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Chunked(chunks) => chunks.iter().map(Bytes::len).sum(),
            Self::Empty | Self::Scalar(_) | Self::Structured(_) => 0,
        }
    }
}

/// One registered callback that a notification must reach.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRecipient {
    /// Client that registered the callback.
    pub client_id: ClientId,
    /// Client-assigned callback id; absent for per-client callbacks
    /// (continuous queries, tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<CallbackId>,
    /// How much of the item the callback wants.
    #[serde(default)]
    pub data_filter: EventDataFilter,
    /// Whether a remove callback also wants expirations.
    #[serde(default)]
    pub notify_on_expiration: bool,
}

impl CallbackRecipient {
    /// A per-client recipient with no callback id.
    pub fn client(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: client_id.into(),
            callback_id: None,
            data_filter: EventDataFilter::None,
            notify_on_expiration: false,
        }
    }

    /// A recipient identified by client id and callback id.
    pub fn callback(client_id: impl Into<ClientId>, callback_id: i16) -> Self {
        Self {
            callback_id: Some(CallbackId(callback_id)),
            ..Self::client(client_id)
        }
    }

    /// Set the data filter.
    #[must_use]
    pub fn with_data_filter(mut self, filter: EventDataFilter) -> Self {
        self.data_filter = filter;
        self
    }

    /// Also deliver expirations to this recipient.
    #[must_use]
    pub fn notify_on_expiration(mut self, yes: bool) -> Self {
        self.notify_on_expiration = yes;
        self
    }
}

/// Body of a notification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Affected key; empty for cache-wide events.
    pub key: String,
    /// Item value, if the event carries one.
    #[serde(default)]
    pub value: ItemValue,
    /// Storage and format flags.
    #[serde(default)]
    pub flags: EventFlags,
    /// Why the item was removed; only set for removals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_reason: Option<ItemRemoveReason>,
    /// Sessions registered against the key when the event was raised.
    #[serde(default)]
    pub subscribers: Vec<ClientId>,
    /// Callbacks the event must reach (callback categories only).
    #[serde(default)]
    pub recipients: Vec<CallbackRecipient>,
}

impl EventPayload {
    /// A payload for a cache-wide event with no key.
    pub fn cache_wide() -> Self {
        Self::default()
    }

    /// A payload for the given key.
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Attach a value.
    #[must_use]
    pub fn with_value(mut self, value: ItemValue) -> Self {
        self.value = value;
        self
    }

    /// Attach flags.
    #[must_use]
    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attach a removal reason.
    #[must_use]
    pub fn with_removal_reason(mut self, reason: ItemRemoveReason) -> Self {
        self.removal_reason = Some(reason);
        self
    }

    /// Copy in the sessions subscribed to the key.
    #[must_use]
    pub fn with_subscribers<I, C>(mut self, subscribers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClientId>,
    {
        self.subscribers = subscribers.into_iter().map(Into::into).collect();
        self
    }

    /// Copy in the callbacks the event must reach.
    #[must_use]
    pub fn with_recipients<I>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = CallbackRecipient>,
    {
        self.recipients = recipients.into_iter().collect();
        self
    }

    /// Whether the payload refers to a key rather than the whole cache.
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_query() {
        let mut flags = EventFlags::COMPRESSED | EventFlags::BINARY_DATA;
        assert!(flags.contains(EventFlags::COMPRESSED));
        assert!(flags.contains(EventFlags::COMPRESSED | EventFlags::BINARY_DATA));
        assert!(!flags.contains(EventFlags::JSON_DATA));

        flags |= EventFlags::WRITE_THRU;
        assert!(flags.contains(EventFlags::WRITE_THRU));
        flags.remove(EventFlags::COMPRESSED);
        assert!(!flags.contains(EventFlags::COMPRESSED));
        assert!(!flags.is_empty());
        assert!(EventFlags::NONE.is_empty());
    }

    #[test]
    fn flags_debug_lists_names() {
        let flags = EventFlags::LOCKED_ITEM | EventFlags::WRITE_BEHIND;
        assert_eq!(format!("{flags:?}"), "EventFlags(LOCKED_ITEM | WRITE_BEHIND)");
    }

    #[test]
    fn flags_keep_unknown_bits() {
        let flags = EventFlags::from_bits((1 << 20) | 1);
        assert_eq!(flags.bits(), (1 << 20) | 1);
        assert!(flags.contains(EventFlags::LOCKED_ITEM));
        assert_eq!(serde_json::to_string(&flags).unwrap(), ((1u32 << 20) | 1).to_string());
    }

    #[test]
    fn item_value_byte_len() {
        assert_eq!(ItemValue::Empty.byte_len(), 0);
        assert_eq!(ItemValue::Bytes(Bytes::from_static(b"abcd")).byte_len(), 4);
        let chunked = ItemValue::Chunked(vec![
            Bytes::from_static(b"ab"),
            Bytes::from_static(b"cde"),
        ]);
        assert_eq!(chunked.byte_len(), 5);
        assert_eq!(ItemValue::Scalar(Scalar::Int(9)).byte_len(), 0);
        assert!(ItemValue::default().is_empty());
    }

    #[test]
    fn item_value_json_is_tagged() {
        let v = ItemValue::Scalar(Scalar::Text("hi".into()));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["shape"], "scalar");
        assert_eq!(json["data"]["type"], "text");
        assert_eq!(json["data"]["value"], "hi");
    }

    #[test]
    fn recipient_builders() {
        let r = CallbackRecipient::callback("c1", 7)
            .with_data_filter(EventDataFilter::DataWithMetadata)
            .notify_on_expiration(true);
        assert_eq!(r.client_id.as_str(), "c1");
        assert_eq!(r.callback_id, Some(CallbackId(7)));
        assert_eq!(r.data_filter, EventDataFilter::DataWithMetadata);
        assert!(r.notify_on_expiration);

        let cq = CallbackRecipient::client("c2");
        assert_eq!(cq.callback_id, None);
        assert!(!cq.notify_on_expiration);
    }

    #[test]
    fn payload_builders_copy_lists() {
        let mut live = vec![CallbackRecipient::callback("c1", 1)];
        let payload = EventPayload::for_key("k1")
            .with_removal_reason(ItemRemoveReason::Expired)
            .with_subscribers(["s1", "s2"])
            .with_recipients(live.clone());

        live.push(CallbackRecipient::callback("c9", 9));

        assert_eq!(payload.key, "k1");
        assert!(payload.has_key());
        assert_eq!(payload.removal_reason, Some(ItemRemoveReason::Expired));
        assert_eq!(payload.subscribers.len(), 2);
        assert_eq!(payload.recipients.len(), 1);
        assert!(!EventPayload::cache_wide().has_key());
    }

    #[test]
    fn recipient_json_defaults() {
        let r: CallbackRecipient = serde_json::from_str(r#"{"clientId": "c1"}"#).unwrap();
        assert_eq!(r, CallbackRecipient::client("c1"));
    }
}
