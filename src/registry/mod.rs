//! Error Registry - bounded, persistent store of error records
//!
//! One `parking_lot::Mutex` guards the records for the full duration of
//! every operation, including the synchronous primary snapshot write that
//! follows each mutation.

mod crud;
mod query;
mod stats;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::persistence::{newest_first, SnapshotManager};
use crate::sink::{ErrorSink, TracingSink};
use crate::types::{ErrorRecord, RecordMap, Severity};

pub use stats::RegistryStats;

/// Mutable state behind the registry lock
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) records: RecordMap,
    pub(crate) severity: Severity,
    pub(crate) evicted_count: u64,
}

/// Bounded registry of error records for one key
pub struct ErrorRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) snapshots: SnapshotManager,
    pub(crate) state: Mutex<RegistryState>,
    pub(crate) sink: Arc<dyn ErrorSink>,
}

impl ErrorRegistry {
    /// Create an empty registry that logs through `tracing`
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create an empty registry forwarding to a custom sink
    pub fn with_sink(config: RegistryConfig, sink: Arc<dyn ErrorSink>) -> RegistryResult<Self> {
        config.validate()?;

        let snapshots = SnapshotManager::new(
            &config.primary_snapshot_path,
            &config.recovery_snapshot_path,
        );
        let state = RegistryState {
            severity: config.severity,
            ..Default::default()
        };

        Ok(Self {
            config,
            snapshots,
            state: Mutex::new(state),
            sink,
        })
    }

    /// Create a registry and restore it from the primary snapshot, if any.
    ///
    /// An unreadable snapshot is logged and the registry starts empty.
    pub fn open(config: RegistryConfig, sink: Arc<dyn ErrorSink>) -> RegistryResult<Self> {
        let registry = Self::with_sink(config, sink)?;

        match registry.snapshots.cleanup_temp_files() {
            Ok(0) => {}
            Ok(cleaned) => {
                info!(key = %registry.config.key, cleaned, "removed stale snapshot temp files")
            }
            Err(e) => {
                warn!(key = %registry.config.key, error = %e, "could not remove stale temp files")
            }
        }

        if registry.snapshots.primary_exists() {
            match registry.snapshots.load_primary() {
                Ok(records) => {
                    let restored = registry.restore(records);
                    info!(
                        key = %registry.config.key,
                        restored,
                        "restored errors from primary snapshot"
                    );
                }
                Err(e) => warn!(
                    key = %registry.config.key,
                    path = %registry.snapshots.primary_path().display(),
                    error = %e,
                    "primary snapshot unreadable, starting empty"
                ),
            }
        }

        Ok(registry)
    }

    /// Replace the in-memory records with the valid entries of `records`,
    /// keeping the newest `max_size` if there are too many
    fn restore(&self, records: RecordMap) -> usize {
        let total = records.len();
        let valid: Vec<&ErrorRecord> = records
            .iter()
            .filter(|&(id, r)| {
                !id.is_empty() && *id == r.id && r.message.len() <= self.config.max_message_size
            })
            .map(|(_, r)| r)
            .collect();
        let rejected = total - valid.len();

        let kept: RecordMap = newest_first(valid, self.config.max_size)
            .into_iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();

        if rejected > 0 {
            warn!(
                key = %self.config.key,
                rejected,
                "primary snapshot holds invalid errors, skipped them"
            );
        }
        if kept.len() + rejected < total {
            warn!(
                key = %self.config.key,
                total,
                kept = kept.len(),
                "primary snapshot exceeds capacity, dropped oldest errors"
            );
        }

        let restored = kept.len();
        self.state.lock().records = kept;
        restored
    }

    /// Mirror `state` to the primary snapshot. Failures are logged and
    /// passed to the sink; the in-memory state is authoritative.
    pub(crate) fn persist(&self, state: &RegistryState) {
        if let Err(e) = self.snapshots.write_primary(&state.records) {
            error!(
                key = %self.config.key,
                path = %self.snapshots.primary_path().display(),
                error = %e,
                "failed to save errors to file"
            );
            self.sink.persistence_failed(&self.config.key, &e);
        }
    }

    /// Write up to `limit` of the newest records to the recovery snapshot.
    ///
    /// Returns the number of records written.
    pub fn save_recovery_snapshot(&self, limit: usize) -> RegistryResult<usize> {
        let state = self.state.lock();
        self.snapshots.write_recovery(state.records.values(), limit)
    }

    /// Write the recovery snapshot, then clear the store, in one critical
    /// section. The clear happens even if the write failed; its error is
    /// returned afterwards.
    pub(crate) fn rotate(&self, limit: usize) -> RegistryResult<usize> {
        if limit == 0 {
            return Err(RegistryError::InvalidLimit(limit));
        }

        let mut state = self.state.lock();
        let written = self.snapshots.write_recovery(state.records.values(), limit);
        state.records.clear();
        self.persist(&state);
        written
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    pub fn max_message_size(&self) -> usize {
        self.config.max_message_size
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Severity assigned to records created from now on
    pub fn severity(&self) -> Severity {
        self.state.lock().severity
    }
}

// Public surface, implemented in the submodules
impl ErrorRegistry {
    // Mutations (from crud.rs)
    pub fn add(&self, id: &str, error_type: &str, message: &str) -> RegistryResult<ErrorRecord> {
        crud::add(self, id, error_type, message)
    }

    pub fn delete(&self, id: &str) -> RegistryResult<()> {
        crud::delete(self, id)
    }

    pub fn acknowledge(&self, id: &str) -> RegistryResult<()> {
        crud::acknowledge(self, id)
    }

    pub fn clear_all(&self) {
        crud::clear_all(self)
    }

    pub fn set_severity(&self, severity: Severity) {
        crud::set_severity(self, severity)
    }

    // In-memory and on-disk views (from query.rs)
    pub fn get_all(&self) -> RecordMap {
        query::get_all(self)
    }

    pub fn get_by_type(&self, error_type: &str) -> RecordMap {
        query::get_by_type(self, error_type)
    }

    pub fn get_current(&self) -> RecordMap {
        query::get_current(self)
    }

    pub fn get(&self, id: &str) -> Option<ErrorRecord> {
        query::get(self, id)
    }

    pub fn json_dump(&self) -> RegistryResult<String> {
        query::json_dump(self)
    }

    pub fn load_primary_snapshot(&self) -> RegistryResult<RecordMap> {
        self.snapshots.load_primary()
    }

    pub fn load_recovery_snapshot(&self) -> RegistryResult<Vec<ErrorRecord>> {
        self.snapshots.load_recovery()
    }

    pub fn load_recovery_snapshot_by_type(
        &self,
        error_type: &str,
    ) -> RegistryResult<Vec<ErrorRecord>> {
        self.snapshots.load_recovery_by_type(error_type)
    }

    // Counters (from stats.rs)
    pub fn stats(&self) -> RegistryStats {
        stats::collect(self)
    }
}

impl std::fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRegistry")
            .field("key", &self.config.key)
            .field("max_size", &self.config.max_size)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::sink::testing::RecordingSink;
    use crate::sink::NullSink;
    use tempfile::TempDir;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Collects the level and message of every event
    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<parking_lot::Mutex<Vec<(Level, String)>>>);

    struct MessageField(String);

    impl Visit for MessageField {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = MessageField(String::new());
            event.record(&mut message);
            self.0.lock().push((*event.metadata().level(), message.0));
        }
    }

    fn config(dir: &TempDir) -> RegistryConfig {
        RegistryConfig::new("test", dir.path()).with_max_size(3)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let result = ErrorRegistry::new(config(&dir).with_max_size(0));
        assert!(matches!(result, Err(RegistryError::InvalidArgument(_))));
    }

    #[test]
    fn test_open_restores_primary_snapshot() {
        let dir = TempDir::new().unwrap();
        {
            let registry = ErrorRegistry::new(config(&dir)).unwrap();
            registry.add("e1", "disk", "disk full").unwrap();
            registry.add("e2", "net", "link down").unwrap();
            registry.acknowledge("e2").unwrap();
        }

        let reopened = ErrorRegistry::open(config(&dir), Arc::new(NullSink)).unwrap();
        let all = reopened.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["e2"].state, crate::types::ErrorState::Acknowledged);
    }

    #[test]
    fn test_open_trims_to_capacity() {
        let dir = TempDir::new().unwrap();
        {
            let registry = ErrorRegistry::new(config(&dir).with_max_size(10)).unwrap();
            for i in 0..5 {
                registry.add(&format!("e{}", i), "disk", "x").unwrap();
                std::thread::sleep(std::time::Duration::from_millis(2));
            }
        }

        let reopened =
            ErrorRegistry::open(config(&dir).with_max_size(2), Arc::new(NullSink)).unwrap();
        let ids: Vec<String> = reopened.get_all().into_keys().collect();
        assert_eq!(ids, vec!["e3".to_string(), "e4".to_string()]);
    }

    #[test]
    fn test_open_with_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        std::fs::write(&cfg.primary_snapshot_path, "{ broken").unwrap();

        let registry = ErrorRegistry::open(cfg, Arc::new(NullSink)).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_open_removes_stale_temp_file() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let temp = crate::persistence::temp_path_for(&cfg.primary_snapshot_path);
        std::fs::write(&temp, "half written").unwrap();

        ErrorRegistry::open(cfg, Arc::new(NullSink)).unwrap();
        assert!(!temp.exists());
    }

    #[test]
    fn test_persistence_failure_is_reported_not_returned() {
        let dir = TempDir::new().unwrap();
        // A directory where the primary snapshot file should be makes the rename fail
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();
        let cfg = config(&dir).with_primary_snapshot_path(&blocked);

        let sink = Arc::new(RecordingSink::default());
        let registry = ErrorRegistry::with_sink(cfg, sink.clone()).unwrap();

        registry.add("e1", "disk", "disk full").unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(sink.failures.lock().len(), 1);
    }

    #[test]
    fn test_persistence_failure_is_logged_with_silent_sink() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();
        let cfg = config(&dir).with_primary_snapshot_path(&blocked);
        let registry = ErrorRegistry::with_sink(cfg, Arc::new(NullSink)).unwrap();

        let captured = CapturedEvents::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        tracing::subscriber::with_default(subscriber, || {
            registry.add("e1", "disk", "disk full").unwrap();
        });

        let events = captured.0.lock();
        assert!(events
            .iter()
            .any(|(level, message)| *level == Level::ERROR
                && message == "failed to save errors to file"));
    }

    #[test]
    fn test_open_skips_invalid_records_before_trimming() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir).with_max_size(2).with_max_message_size(8);
        let base = chrono::Utc::now();
        let at = |secs: i64| base + chrono::Duration::seconds(secs);

        let mut records = RecordMap::new();
        for (id, message, secs) in [
            ("old", "ok", 0),
            ("mid", "ok", 1),
            ("huge", "far too long", 2),
            ("", "ok", 3),
        ] {
            let record = ErrorRecord::with_timestamp(
                id.to_string(),
                "disk".to_string(),
                message.to_string(),
                Severity::Error,
                at(secs),
            );
            records.insert(id.to_string(), record);
        }
        let text = serde_json::to_string_pretty(&records).unwrap();
        std::fs::write(&cfg.primary_snapshot_path, text).unwrap();

        let registry = ErrorRegistry::open(cfg, Arc::new(NullSink)).unwrap();
        let ids: Vec<String> = registry.get_all().into_keys().collect();
        assert_eq!(ids, vec!["mid".to_string(), "old".to_string()]);
    }
}
