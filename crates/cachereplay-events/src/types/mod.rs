//! Notification record types.
//!
//! All wire-facing types use `#[serde(rename_all = "camelCase")]` for
//! structs and `snake_case` for enum variants.

mod category;
mod event_id;
mod payload;
mod record;
mod subscription;

pub use category::EventCategory;
pub use event_id::EventId;
pub use payload::{
    CallbackRecipient, EventDataFilter, EventFlags, EventPayload, ItemRemoveReason, ItemValue,
    Scalar,
};
pub use record::EventRecord;
pub use subscription::SubscriptionMask;
