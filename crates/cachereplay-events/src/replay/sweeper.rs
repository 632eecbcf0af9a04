//! Background head eviction.

use std::sync::Arc;
use std::time::Duration;

use cachereplay_core::metrics::REPLAY_WINDOW_LEN;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::log::EventLog;

/// Evict expired heads from `log` every `interval` until `cancel` fires.
///
/// Returns the number of items this loop evicted. Snapshots evict lazily
/// on their own; the sweep only bounds memory while nobody is reading.
pub async fn run_sweeper<T>(
    log: Arc<EventLog<T>>,
    interval: Duration,
    cancel: CancellationToken,
) -> u64
where
    T: Send + Sync + 'static,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut swept: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = log.evict_expired();
                swept += u64::try_from(evicted).unwrap_or(u64::MAX);
                #[allow(clippy::cast_precision_loss)]
                let retained = log.len() as f64;
                metrics::gauge!(REPLAY_WINDOW_LEN).set(retained);
                if evicted > 0 {
                    debug!(evicted, "sweep evicted expired records");
                }
            }
            () = cancel.cancelled() => {
                return swept;
            }
        }
    }
}
