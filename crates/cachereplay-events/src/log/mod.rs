//! Sliding time-window log.
//!
//! [`EventLog`] is an append-only sequence of items, each stamped with its
//! arrival [`Instant`]. Only items that arrived within the last `W` seconds
//! are visible. Expired items are dropped from the head lazily, on
//! [`EventLog::snapshot`] or an explicit [`EventLog::evict_expired`].
//!
//! Producers and readers share one [`parking_lot::Mutex`] per log. Appends
//! hold it for a single tail insert; snapshots hold it for head eviction
//! plus a clone of the retained `Arc`s, and callers filter the copy after
//! the lock is released.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cachereplay_core::metrics::REPLAY_EVENTS_EVICTED_TOTAL;
use cachereplay_core::{Clock, ReplayError, Result};
use parking_lot::Mutex;
use tracing::trace;

struct Entry<T> {
    arrived_at: Instant,
    item: Arc<T>,
}

/// Append-only log retaining the last `W` seconds of items.
pub struct EventLog<T> {
    window: Duration,
    window_secs: u64,
    clock: Arc<dyn Clock>,
    entries: Mutex<VecDeque<Entry<T>>>,
    appended: AtomicU64,
    evicted: AtomicU64,
}

impl<T> EventLog<T> {
    /// Create a log with a window of `window_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidWindow`] when `window_secs` is zero.
    pub fn new(window_secs: u64, clock: Arc<dyn Clock>) -> Result<Self> {
        if window_secs == 0 {
            return Err(ReplayError::InvalidWindow(window_secs));
        }
        Ok(Self {
            window: Duration::from_secs(window_secs),
            window_secs,
            clock,
            entries: Mutex::new(VecDeque::new()),
            appended: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        })
    }

    /// Retention window in seconds.
    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Append `item` at the tail. Never scans or evicts.
    pub fn append(&self, item: T) {
        self.append_shared(Arc::new(item));
    }

    /// Append an already shared item.
    pub fn append_shared(&self, item: Arc<T>) {
        let mut entries = self.entries.lock();
        // Stamped under the lock so arrival times never decrease along the queue.
        let arrived_at = self.clock.now();
        entries.push_back(Entry { arrived_at, item });
        drop(entries);
        let _ = self.appended.fetch_add(1, Ordering::Relaxed);
    }

    /// Items currently inside the window, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        let mut entries = self.entries.lock();
        let evicted = self.evict_locked(&mut entries);
        let items = entries.iter().map(|e| Arc::clone(&e.item)).collect();
        drop(entries);
        self.note_evicted(evicted);
        items
    }

    /// Drop expired items from the head, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let evicted = {
            let mut entries = self.entries.lock();
            self.evict_locked(&mut entries)
        };
        self.note_evicted(evicted);
        evicted
    }

    /// Number of stored items, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log stores nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every stored item.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Total items ever appended.
    pub fn appended_total(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    /// Total items ever dropped by window eviction.
    pub fn evicted_total(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn evict_locked(&self, entries: &mut VecDeque<Entry<T>>) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        while let Some(head) = entries.front() {
            if now.saturating_duration_since(head.arrived_at) <= self.window {
                break;
            }
            let _ = entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    fn note_evicted(&self, evicted: usize) {
        if evicted == 0 {
            return;
        }
        let n = u64::try_from(evicted).unwrap_or(u64::MAX);
        let _ = self.evicted.fetch_add(n, Ordering::Relaxed);
        metrics::counter!(REPLAY_EVENTS_EVICTED_TOTAL).increment(n);
        trace!(evicted, "evicted expired items");
    }
}

impl<T> std::fmt::Debug for EventLog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("window_secs", &self.window_secs)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
