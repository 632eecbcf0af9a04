//! The replay service: one log, a write path and a filtered read path.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cachereplay_core::metrics::{
    REPLAY_EVENTS_DROPPED_TOTAL, REPLAY_EVENTS_RECORDED_TOTAL, REPLAY_EVENTS_RETURNED_TOTAL,
    REPLAY_REQUESTS_TOTAL, REPLAY_WINDOW_LEN,
};
use cachereplay_core::{CallbackId, ClientId, Clock, ReplayError, Result, SystemClock};
use cachereplay_settings::ReplaySettings;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{ReplayRequest, ReplayStats, run_sweeper};
use crate::log::EventLog;
use crate::types::{EventId, EventRecord, SubscriptionMask};

type RecordLog = EventLog<EventRecord>;

/// Owner of one notification log.
///
/// Cache mutation paths call [`record`](Self::record); reconnecting or
/// polling clients call [`get_filtered_replay_list`](Self::get_filtered_replay_list)
/// or [`replay`](Self::replay). Construct one per cache instance and share
/// it by `Arc`.
///
/// Lifecycle is constructed, serving, disposed. After
/// [`dispose`](Self::dispose) the producer path silently drops records and
/// the read path returns [`ReplayError::Disposed`].
pub struct NotificationReplayService {
    log: RwLock<Option<Arc<RecordLog>>>,
    clock: Arc<dyn Clock>,
    started_at: Instant,
    window: Duration,
    window_secs: u64,
    cancel: CancellationToken,
}

impl NotificationReplayService {
    /// Create a service on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidWindow`] when `window_secs` is zero.
    pub fn new(window_secs: u64) -> Result<Self> {
        Self::with_clock(window_secs, Arc::new(SystemClock))
    }

    /// Create a service on an explicit clock.
    pub fn with_clock(window_secs: u64, clock: Arc<dyn Clock>) -> Result<Self> {
        let log = EventLog::new(window_secs, Arc::clone(&clock))?;
        let started_at = clock.now();
        info!(window_secs, "replay service started");
        Ok(Self {
            log: RwLock::new(Some(Arc::new(log))),
            clock,
            started_at,
            window: Duration::from_secs(window_secs),
            window_secs,
            cancel: CancellationToken::new(),
        })
    }

    /// Build a service from settings, spawning the sweeper when enabled.
    ///
    /// The sweeper needs a tokio runtime; outside one it is skipped and
    /// eviction stays lazy.
    pub fn from_settings(settings: &ReplaySettings) -> Result<Arc<Self>> {
        let service = Arc::new(Self::new(settings.retention.window_secs)?);
        if settings.retention.sweep_enabled {
            let _ = service.spawn_sweeper(settings.retention.sweep_interval());
        }
        Ok(service)
    }

    /// Retention window in seconds.
    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.log.read().is_none()
    }

    fn log(&self) -> Result<Arc<RecordLog>> {
        self.log
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(ReplayError::Disposed)
    }

    /// Append a notification. Never fails; after disposal the record is
    /// dropped with a warning.
    pub fn record(&self, record: EventRecord) {
        let category = record.category();
        // The read guard is held across the append so `dispose` cannot
        // detach the log between the check and the insert.
        let guard = self.log.read();
        let Some(log) = guard.as_ref() else {
            warn!(event_id = %record.id(), "record on disposed replay service dropped");
            metrics::counter!(REPLAY_EVENTS_DROPPED_TOTAL).increment(1);
            return;
        };
        debug!(event_id = %record.id(), key = record.key(), "recorded notification");
        log.append(record);
        drop(guard);
        metrics::counter!(REPLAY_EVENTS_RECORDED_TOTAL, "category" => category.as_str())
            .increment(1);
    }

    /// Whether the service has been alive for at least one full window.
    ///
    /// `false` means the log cannot yet prove it holds everything from the
    /// last `W` seconds, not that nothing happened.
    pub fn has_complete_data(&self) -> Result<bool> {
        let _ = self.log()?;
        Ok(self.uptime() >= self.window)
    }

    /// Every record currently inside the window, oldest first.
    pub fn snapshot(&self) -> Result<Vec<Arc<EventRecord>>> {
        Ok(self.log()?.snapshot())
    }

    /// Records `client_id` has not consumed and is entitled to, in arrival
    /// order.
    ///
    /// A record is kept when its id is not in `already_seen` and either it
    /// is a broadcast that `mask` permits or it is a callback addressed to
    /// `client_id`. Each id appears at most once in the result.
    pub fn get_filtered_replay_list(
        &self,
        client_id: &ClientId,
        already_seen: &HashSet<EventId>,
        mask: SubscriptionMask,
    ) -> Result<Vec<Arc<EventRecord>>> {
        self.filtered(client_id, already_seen, mask, None)
    }

    /// [`get_filtered_replay_list`](Self::get_filtered_replay_list) driven by
    /// a [`ReplayRequest`], honoring its callback-id narrowing.
    pub fn replay(&self, request: &ReplayRequest) -> Result<Vec<Arc<EventRecord>>> {
        self.filtered(
            &request.client_id,
            &request.already_seen,
            request.mask,
            request.callbacks.as_ref(),
        )
    }

    #[instrument(skip_all, fields(client_id = %client_id))]
    fn filtered(
        &self,
        client_id: &ClientId,
        already_seen: &HashSet<EventId>,
        mask: SubscriptionMask,
        callbacks: Option<&HashSet<CallbackId>>,
    ) -> Result<Vec<Arc<EventRecord>>> {
        let snapshot = self.log()?.snapshot();
        let retained = snapshot.len();

        // Filtering runs on the copied snapshot, outside the log lock.
        let mut emitted: HashSet<&EventId> = HashSet::new();
        let mut replay = Vec::new();
        for rec in &snapshot {
            if already_seen.contains(rec.id())
                || !rec.is_deliverable_to(client_id, mask, callbacks)
            {
                continue;
            }
            if emitted.insert(rec.id()) {
                replay.push(Arc::clone(rec));
            }
        }

        metrics::counter!(REPLAY_REQUESTS_TOTAL).increment(1);
        metrics::counter!(REPLAY_EVENTS_RETURNED_TOTAL)
            .increment(u64::try_from(replay.len()).unwrap_or(u64::MAX));
        #[allow(clippy::cast_precision_loss)]
        let window_len = retained as f64;
        metrics::gauge!(REPLAY_WINDOW_LEN).set(window_len);
        debug!(retained, returned = replay.len(), "served replay");
        Ok(replay)
    }

    /// Counters for diagnostics.
    pub fn stats(&self) -> Result<ReplayStats> {
        let log = self.log()?;
        let uptime = self.uptime();
        Ok(ReplayStats {
            retained: log.len(),
            recorded: log.appended_total(),
            evicted: log.evicted_total(),
            window_secs: self.window_secs,
            uptime,
            complete: uptime >= self.window,
        })
    }

    /// Spawn the periodic head eviction on the current tokio runtime.
    ///
    /// Returns `None` when there is no runtime, the interval is zero, or
    /// the service is disposed. The task stops on [`dispose`](Self::dispose)
    /// or when the service is dropped and yields how many records it evicted.
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<JoinHandle<u64>> {
        if interval.is_zero() {
            warn!("sweep interval is zero, background sweep disabled");
            return None;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!("no tokio runtime, background sweep disabled");
            return None;
        };
        let log = self.log().ok()?;
        let cancel = self.cancel.child_token();
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        info!(interval_ms, "replay sweeper started");
        Some(handle.spawn(async move {
            let swept = run_sweeper(log, interval, cancel).await;
            info!(swept, "replay sweeper stopped");
            swept
        }))
    }

    /// Discard the log and stop the sweeper. Idempotent.
    #[instrument(skip_all)]
    pub fn dispose(&self) {
        let Some(log) = self.log.write().take() else {
            return;
        };
        self.cancel.cancel();
        let discarded = log.len();
        log.clear();
        info!(discarded, "replay service disposed");
    }

    fn uptime(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }
}

impl Drop for NotificationReplayService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for NotificationReplayService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationReplayService")
            .field("window_secs", &self.window_secs)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use cachereplay_core::ManualClock;
    use cachereplay_core::logging::capture_logs;
    use tracing::Level;

    use super::*;
    use crate::types::{CallbackRecipient, EventCategory, EventPayload};

    fn service(window_secs: u64) -> (NotificationReplayService, ManualClock) {
        let clock = ManualClock::new();
        let svc = NotificationReplayService::with_clock(window_secs, Arc::new(clock.clone()))
            .unwrap();
        (svc, clock)
    }

    fn broadcast(op: i64, category: EventCategory, key: &str) -> EventRecord {
        EventRecord::new(EventId::new("n1", op, 0, category), EventPayload::for_key(key))
    }

    fn ops(records: &[Arc<EventRecord>]) -> Vec<i64> {
        records.iter().map(|r| r.id().operation_counter).collect()
    }

    #[test]
    fn zero_window_rejected() {
        assert_matches!(
            NotificationReplayService::new(0),
            Err(ReplayError::InvalidWindow(0))
        );
    }

    #[test]
    fn completeness_after_one_window() {
        let (svc, clock) = service(5);
        assert!(!svc.has_complete_data().unwrap());
        clock.advance(Duration::from_millis(4_999));
        assert!(!svc.has_complete_data().unwrap());
        clock.advance(Duration::from_millis(1));
        assert!(svc.has_complete_data().unwrap());
        clock.advance_secs(100);
        assert!(svc.has_complete_data().unwrap());
    }

    #[test]
    fn already_seen_is_excluded() {
        let (svc, _) = service(30);
        let a = broadcast(1, EventCategory::ItemAddedBroadcast, "k1");
        let seen: HashSet<_> = [a.id().clone()].into();
        svc.record(a);
        svc.record(broadcast(2, EventCategory::ItemAddedBroadcast, "k2"));

        let out = svc
            .get_filtered_replay_list(&ClientId::from("C1"), &seen, SubscriptionMask::all())
            .unwrap();
        assert_eq!(ops(&out), vec![2]);
    }

    #[test]
    fn duplicate_ids_returned_once() {
        let (svc, _) = service(30);
        let rec = EventRecord::new(
            EventId::new("n1", 1, 0, EventCategory::TaskCallback),
            EventPayload::cache_wide().with_recipients([
                CallbackRecipient::client("C1"),
                CallbackRecipient::client("C1"),
            ]),
        );
        svc.record(rec.clone());
        svc.record(rec);
        let out = svc
            .get_filtered_replay_list(&ClientId::from("C1"), &HashSet::new(), SubscriptionMask::none())
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn replay_request_narrows_callbacks() {
        let (svc, _) = service(30);
        svc.record(EventRecord::new(
            EventId::new("n1", 1, 0, EventCategory::ItemRemovedCallback),
            EventPayload::for_key("k1").with_recipients([CallbackRecipient::callback("C1", 4)]),
        ));
        let any = ReplayRequest::new("C1", SubscriptionMask::none());
        assert_eq!(svc.replay(&any).unwrap().len(), 1);
        let other = any.clone().with_callbacks([CallbackId(5)]);
        assert!(svc.replay(&other).unwrap().is_empty());
    }

    #[test]
    fn empty_client_still_gets_broadcasts() {
        let (svc, _) = service(30);
        svc.record(broadcast(1, EventCategory::CacheClearedBroadcast, ""));
        svc.record(EventRecord::new(
            EventId::new("n1", 2, 0, EventCategory::TaskCallback),
            EventPayload::cache_wide().with_recipients([CallbackRecipient::client("")]),
        ));
        let out = svc
            .get_filtered_replay_list(&ClientId::from(""), &HashSet::new(), SubscriptionMask::all())
            .unwrap();
        assert_eq!(ops(&out), vec![1]);
    }

    #[test]
    fn stats_track_activity() {
        let (svc, clock) = service(2);
        svc.record(broadcast(1, EventCategory::ItemAddedBroadcast, "k1"));
        svc.record(broadcast(2, EventCategory::ItemAddedBroadcast, "k2"));
        clock.advance_secs(3);
        let _ = svc.snapshot().unwrap();
        let stats = svc.stats().unwrap();
        assert_eq!(stats.recorded, 2);
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.retained, 0);
        assert_eq!(stats.window_secs, 2);
        assert_eq!(stats.uptime, Duration::from_secs(3));
        assert!(stats.complete);
    }

    #[test]
    fn disposed_service_fails_reads_and_drops_writes() {
        let (logs, _guard) = capture_logs();
        let (svc, _) = service(30);
        svc.record(broadcast(1, EventCategory::ItemAddedBroadcast, "k1"));
        svc.dispose();
        assert!(svc.is_disposed());

        svc.record(broadcast(2, EventCategory::ItemAddedBroadcast, "k2"));
        assert!(logs.has_event(Level::WARN, "disposed replay service"));
        assert!(logs.has_event(Level::INFO, "replay service disposed"));

        assert_matches!(svc.has_complete_data(), Err(ReplayError::Disposed));
        assert_matches!(svc.snapshot(), Err(ReplayError::Disposed));
        assert_matches!(svc.stats(), Err(ReplayError::Disposed));
        assert_matches!(
            svc.get_filtered_replay_list(&ClientId::from("C1"), &HashSet::new(), SubscriptionMask::all()),
            Err(ReplayError::Disposed)
        );
    }

    #[test]
    fn dispose_is_idempotent() {
        let (logs, _guard) = capture_logs();
        let (svc, _) = service(30);
        svc.dispose();
        svc.dispose();
        let disposals = logs
            .events()
            .iter()
            .filter(|e| e.message.contains("replay service disposed"))
            .count();
        assert_eq!(disposals, 1);
    }

    #[test]
    fn snapshots_taken_before_dispose_stay_valid() {
        let (svc, _) = service(30);
        svc.record(broadcast(1, EventCategory::ItemAddedBroadcast, "k1"));
        let snap = svc.snapshot().unwrap();
        svc.dispose();
        assert_eq!(snap[0].key(), "k1");
    }

    #[test]
    fn sweeper_needs_runtime() {
        let (svc, _) = service(30);
        assert!(svc.spawn_sweeper(Duration::from_secs(1)).is_none());
    }

    #[tokio::test]
    async fn zero_sweep_interval_is_refused() {
        let (svc, _) = service(30);
        assert!(svc.spawn_sweeper(Duration::ZERO).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_on_dispose() {
        let (svc, clock) = service(1);
        svc.record(broadcast(1, EventCategory::ItemAddedBroadcast, "k1"));
        let handle = svc.spawn_sweeper(Duration::from_millis(100)).unwrap();

        clock.advance_secs(2);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(svc.stats().unwrap().retained, 0);

        svc.dispose();
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn from_settings_spawns_sweeper() {
        let settings = ReplaySettings::default();
        let svc = NotificationReplayService::from_settings(&settings).unwrap();
        assert_eq!(svc.window_secs(), 30);
        assert!(!svc.has_complete_data().unwrap());
        svc.dispose();
    }

    #[test]
    fn from_settings_rejects_zero_window() {
        let mut settings = ReplaySettings::default();
        settings.retention.window_secs = 0;
        settings.retention.sweep_enabled = false;
        assert_matches!(
            NotificationReplayService::from_settings(&settings),
            Err(ReplayError::InvalidWindow(0))
        );
    }

    #[test]
    fn debug_shows_lifecycle() {
        let (svc, _) = service(30);
        assert!(format!("{svc:?}").contains("disposed: false"));
        svc.dispose();
        assert!(format!("{svc:?}").contains("disposed: true"));
    }
}
