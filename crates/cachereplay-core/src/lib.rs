//! # cachereplay-core
//!
//! Foundation types, errors, clocks, and logging for the cache notification
//! replay log.
//!
//! This crate provides the shared vocabulary the replay crates depend on:
//!
//! - **Branded IDs**: `ClientId` and `NodeId` newtypes, `CallbackId` for registered callbacks
//! - **Clocks**: [`Clock`] trait with [`SystemClock`] for production and [`ManualClock`] for tests
//! - **Errors**: [`ReplayError`] via `thiserror`
//! - **Logging**: `tracing` subscriber bootstrap and an in-memory capture layer for tests
//! - **Metrics**: metric name constants shared by recorders and exporters

pub mod clock;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ReplayError, Result};
pub use ids::{CallbackId, ClientId, NodeId};
