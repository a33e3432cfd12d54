//! Crash-recovery snapshots: periodic capture, bounded retention, restore.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use folio_model::Snapshot;
use folio_store::{schema, Store};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Source of the current time.
///
/// The recovery manager never reads the system clock directly, so tests
/// drive retention and scheduling deterministically with [`ManualClock`].
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Advances the clock.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Produces the payload for one snapshot capture.
pub type SnapshotFn = Arc<dyn Fn() -> CoreResult<Value> + Send + Sync>;

/// Tuning knobs for the recovery manager.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// How often an armed page is captured.
    pub interval: Duration,
    /// How many snapshots per page stay in memory.
    pub max_in_memory: usize,
    /// How long store-side snapshots are kept.
    pub retention: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::seconds(60),
            max_in_memory: 10,
            retention: Duration::hours(24),
        }
    }
}

struct PageTimer {
    producer: SnapshotFn,
    next_due: DateTime<Utc>,
}

/// Periodic snapshot capture and recovery for open pages.
///
/// Each armed page has a producer callback and a due time; [`tick`] fires
/// every capture whose interval has elapsed. Captures land in a bounded
/// per-page in-memory ring and in the store's snapshots collection, where
/// entries older than the retention window are purged lazily on every
/// write.
///
/// Scheduling is pull-based: the embedding application calls [`tick`] from
/// whatever timer or event loop it runs. The manager keeps no threads of
/// its own.
///
/// [`tick`]: RecoveryManager::tick
pub struct RecoveryManager {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    config: RecoveryConfig,
    cache: RwLock<HashMap<String, VecDeque<Snapshot>>>,
    timers: Mutex<HashMap<String, PageTimer>>,
}

impl RecoveryManager {
    /// Creates a manager on the system clock.
    #[must_use]
    pub fn new(store: Arc<Store>, config: RecoveryConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a manager on an injected clock.
    #[must_use]
    pub fn with_clock(store: Arc<Store>, config: RecoveryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
            cache: RwLock::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Arms periodic capture for a page. Re-arming an already tracked page
    /// replaces its producer and resets its due time.
    pub fn start_snapshots(&self, page_id: impl Into<String>, producer: SnapshotFn) {
        let page_id = page_id.into();
        let next_due = self.clock.now() + self.config.interval;
        tracing::debug!(page_id, "snapshot capture armed");
        self.timers.lock().insert(
            page_id,
            PageTimer {
                producer,
                next_due,
            },
        );
    }

    /// Disarms a page. Returns whether it was armed.
    pub fn stop_snapshots(&self, page_id: &str) -> bool {
        self.timers.lock().remove(page_id).is_some()
    }

    /// Disarms every page.
    pub fn stop_all(&self) {
        self.timers.lock().clear();
    }

    /// Pages with an armed capture timer.
    #[must_use]
    pub fn tracked_pages(&self) -> Vec<String> {
        self.timers.lock().keys().cloned().collect()
    }

    /// Fires every capture whose interval has elapsed.
    ///
    /// Returns the number of snapshots captured. A failing producer or
    /// store write is logged and leaves the timer armed for the next
    /// interval.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<(String, SnapshotFn)> = {
            let mut timers = self.timers.lock();
            timers
                .iter_mut()
                .filter(|(_, timer)| timer.next_due <= now)
                .map(|(page_id, timer)| {
                    timer.next_due = now + self.config.interval;
                    (page_id.clone(), Arc::clone(&timer.producer))
                })
                .collect()
        };

        let mut captured = 0;
        for (page_id, producer) in due {
            match self.take_snapshot(&page_id, producer.as_ref()) {
                Ok(_) => captured += 1,
                Err(err) => {
                    tracing::warn!(page_id, %err, "periodic snapshot capture failed");
                }
            }
        }
        captured
    }

    /// Captures one snapshot immediately, outside the periodic schedule.
    ///
    /// # Errors
    ///
    /// [`CoreError::SnapshotCapture`] when the producer fails, otherwise
    /// store and encoding errors from persisting the snapshot.
    pub fn take_snapshot(
        &self,
        page_id: &str,
        producer: &(dyn Fn() -> CoreResult<Value>),
    ) -> CoreResult<Snapshot> {
        let payload = producer()
            .map_err(|err| CoreError::snapshot_capture(page_id, err.to_string()))?;
        self.capture(page_id, payload)
    }

    fn capture(&self, page_id: &str, payload: Value) -> CoreResult<Snapshot> {
        let snapshot = Snapshot::new(page_id, self.clock.now(), payload);

        {
            let mut cache = self.cache.write();
            let ring = cache.entry(page_id.to_string()).or_default();
            ring.push_back(snapshot.clone());
            while ring.len() > self.config.max_in_memory {
                ring.pop_front();
            }
        }

        let mut record = serde_json::to_value(&snapshot)?;
        if let Some(fields) = record.as_object_mut() {
            fields.insert("id".to_string(), Value::String(snapshot.record_id()));
        }
        self.store.put(schema::SNAPSHOTS, &record)?;
        self.purge_expired()?;

        tracing::debug!(page_id, timestamp = %snapshot.timestamp, "snapshot captured");
        Ok(snapshot)
    }

    /// Drops store-side snapshots older than the retention window.
    fn purge_expired(&self) -> CoreResult<()> {
        let cutoff = self.clock.now() - self.config.retention;
        for record in self.store.get_all(schema::SNAPSHOTS)? {
            let Some(timestamp) = record
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(|text| text.parse::<DateTime<Utc>>().ok())
            else {
                continue;
            };
            if timestamp < cutoff {
                if let Some(id) = record.get("id").and_then(Value::as_str) {
                    self.store.delete(schema::SNAPSHOTS, id)?;
                }
            }
        }
        Ok(())
    }

    /// The most recent snapshot for a page, if any.
    ///
    /// Prefers the in-memory ring; falls back to the store so a fresh
    /// process can still recover what a crashed one captured.
    pub fn get_latest_snapshot(&self, page_id: &str) -> CoreResult<Option<Snapshot>> {
        if let Some(snapshot) = self
            .cache
            .read()
            .get(page_id)
            .and_then(|ring| ring.back().cloned())
        {
            return Ok(Some(snapshot));
        }

        let mut latest: Option<Snapshot> = None;
        for record in self.store.get_by_index(schema::SNAPSHOTS, "page_id", page_id)? {
            let snapshot = match serde_json::from_value::<Snapshot>(record) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(page_id, %err, "skipping unreadable snapshot record");
                    continue;
                }
            };
            if latest
                .as_ref()
                .is_none_or(|best| snapshot.timestamp > best.timestamp)
            {
                latest = Some(snapshot);
            }
        }
        Ok(latest)
    }

    /// The in-memory snapshots for a page, oldest first.
    #[must_use]
    pub fn get_page_snapshots(&self, page_id: &str) -> Vec<Snapshot> {
        self.cache
            .read()
            .get(page_id)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes every snapshot for a page, in memory and in the store.
    pub fn clear_snapshots(&self, page_id: &str) -> CoreResult<()> {
        self.cache.write().remove(page_id);
        for record in self.store.get_by_index(schema::SNAPSHOTS, "page_id", page_id)? {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                self.store.delete(schema::SNAPSHOTS, id)?;
            }
        }
        Ok(())
    }

    /// Hands the latest snapshot payload to `apply` and reports whether
    /// recovery happened.
    ///
    /// Returns `Ok(false)` when there is nothing to recover or `apply`
    /// declined the payload.
    pub fn recover_page(
        &self,
        page_id: &str,
        apply: impl FnOnce(&Value) -> bool,
    ) -> CoreResult<bool> {
        match self.get_latest_snapshot(page_id)? {
            Some(snapshot) => {
                let applied = apply(&snapshot.payload);
                if applied {
                    tracing::info!(page_id, timestamp = %snapshot.timestamp, "page recovered");
                }
                Ok(applied)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for RecoveryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryManager")
            .field("config", &self.config)
            .field("tracked_pages", &self.tracked_pages())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(0).unwrap()
    }

    fn manager() -> (RecoveryManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = Arc::new(Store::open_in_memory().unwrap());
        let manager = RecoveryManager::with_clock(
            store,
            RecoveryConfig::default(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (manager, clock)
    }

    fn producer(payload: Value) -> SnapshotFn {
        Arc::new(move || Ok(payload.clone()))
    }

    #[test]
    fn latest_snapshot_wins() {
        let (manager, clock) = manager();
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 1})))
            .unwrap();
        clock.advance(Duration::seconds(1));
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 2})))
            .unwrap();

        let latest = manager.get_latest_snapshot("p1").unwrap().unwrap();
        assert_eq!(latest.payload, json!({"rev": 2}));
        assert_eq!(latest.timestamp.timestamp_millis(), 1_000);
    }

    #[test]
    fn tick_fires_only_after_the_interval() {
        let (manager, clock) = manager();
        manager.start_snapshots("p1", producer(json!({"zoom": 1.0})));

        assert_eq!(manager.tick(), 0);
        clock.advance(Duration::seconds(59));
        assert_eq!(manager.tick(), 0);
        clock.advance(Duration::seconds(1));
        assert_eq!(manager.tick(), 1);
        // Re-armed for the next interval, not left permanently due.
        assert_eq!(manager.tick(), 0);
        clock.advance(Duration::seconds(60));
        assert_eq!(manager.tick(), 1);
    }

    #[test]
    fn in_memory_ring_is_bounded() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = RecoveryConfig {
            max_in_memory: 3,
            ..RecoveryConfig::default()
        };
        let manager =
            RecoveryManager::with_clock(store, config, Arc::clone(&clock) as Arc<dyn Clock>);

        for rev in 0..5 {
            manager
                .take_snapshot("p1", &|| Ok(json!({"rev": rev})))
                .unwrap();
            clock.advance(Duration::seconds(1));
        }

        let cached = manager.get_page_snapshots("p1");
        assert_eq!(cached.len(), 3);
        assert_eq!(cached[0].payload, json!({"rev": 2}));
        assert_eq!(cached[2].payload, json!({"rev": 4}));
    }

    #[test]
    fn retention_purges_old_store_snapshots() {
        let (manager, clock) = manager();
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": "old"})))
            .unwrap();

        clock.advance(Duration::hours(25));
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": "new"})))
            .unwrap();

        assert_eq!(manager.store.count(schema::SNAPSHOTS).unwrap(), 1);
        let latest = manager.get_latest_snapshot("p1").unwrap().unwrap();
        assert_eq!(latest.payload, json!({"rev": "new"}));
    }

    #[test]
    fn failing_producer_keeps_the_timer_armed() {
        let (manager, clock) = manager();
        manager.start_snapshots(
            "p1",
            Arc::new(|| Err(CoreError::invalid_operation("surface detached"))),
        );

        clock.advance(Duration::seconds(60));
        assert_eq!(manager.tick(), 0);
        assert_eq!(manager.tracked_pages(), vec!["p1".to_string()]);

        clock.advance(Duration::seconds(60));
        assert_eq!(manager.tick(), 0);
    }

    #[test]
    fn producer_failure_surfaces_as_capture_error() {
        let (manager, _clock) = manager();
        let err = manager
            .take_snapshot("p1", &|| Err(CoreError::invalid_operation("boom")))
            .unwrap_err();
        assert!(matches!(err, CoreError::SnapshotCapture { .. }));
    }

    #[test]
    fn store_fallback_survives_a_cache_wipe() {
        let (manager, _clock) = manager();
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 7})))
            .unwrap();

        // Simulate a fresh process: drop the in-memory ring.
        manager.cache.write().clear();
        assert!(manager.get_page_snapshots("p1").is_empty());

        let latest = manager.get_latest_snapshot("p1").unwrap().unwrap();
        assert_eq!(latest.payload, json!({"rev": 7}));
    }

    #[test]
    fn recover_page_applies_the_latest_payload() {
        let (manager, clock) = manager();
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 1})))
            .unwrap();
        clock.advance(Duration::seconds(1));
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 2})))
            .unwrap();

        let mut seen = None;
        let applied = manager
            .recover_page("p1", |payload| {
                seen = Some(payload.clone());
                true
            })
            .unwrap();
        assert!(applied);
        assert_eq!(seen, Some(json!({"rev": 2})));

        // Nothing for an unknown page.
        assert!(!manager.recover_page("p9", |_| true).unwrap());
    }

    #[test]
    fn clear_snapshots_removes_cache_and_store_entries() {
        let (manager, clock) = manager();
        manager
            .take_snapshot("p1", &|| Ok(json!({"rev": 1})))
            .unwrap();
        clock.advance(Duration::seconds(1));
        manager
            .take_snapshot("p2", &|| Ok(json!({"rev": 1})))
            .unwrap();

        manager.clear_snapshots("p1").unwrap();
        assert!(manager.get_latest_snapshot("p1").unwrap().is_none());
        // Other pages untouched.
        assert!(manager.get_latest_snapshot("p2").unwrap().is_some());
        assert_eq!(manager.store.count(schema::SNAPSHOTS).unwrap(), 1);
    }

    #[test]
    fn stop_snapshots_disarms_a_page() {
        let (manager, clock) = manager();
        manager.start_snapshots("p1", producer(json!({})));
        assert!(manager.stop_snapshots("p1"));
        assert!(!manager.stop_snapshots("p1"));

        clock.advance(Duration::seconds(120));
        assert_eq!(manager.tick(), 0);
    }
}
