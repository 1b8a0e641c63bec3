//! Snapshot files
//!
//! Two independent files back a registry:
//!
//! - the primary snapshot, a JSON object of id → record rewritten after
//!   every mutation
//! - the recovery snapshot, a JSON array of at most `limit` records,
//!   newest first, written by the maintenance task

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ErrorRecord, RecordMap};

use super::atomic::{atomic_write, remove_stale_temp};

/// Reads and writes the two snapshot files of one registry
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    primary_path: PathBuf,
    recovery_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(primary_path: P1, recovery_path: P2) -> Self {
        Self {
            primary_path: primary_path.as_ref().to_path_buf(),
            recovery_path: recovery_path.as_ref().to_path_buf(),
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn recovery_path(&self) -> &Path {
        &self.recovery_path
    }

    pub fn primary_exists(&self) -> bool {
        self.primary_path.exists()
    }

    /// Mirror the full record set to the primary snapshot
    pub fn write_primary(&self, records: &RecordMap) -> RegistryResult<()> {
        let data = serde_json::to_vec_pretty(records).map_err(RegistryError::Encode)?;
        atomic_write(&self.primary_path, &data)?;

        debug!(
            path = %self.primary_path.display(),
            records = records.len(),
            "wrote primary snapshot"
        );
        Ok(())
    }

    /// Read the primary snapshot back
    pub fn load_primary(&self) -> RegistryResult<RecordMap> {
        let data = fs::read(&self.primary_path)?;
        serde_json::from_slice(&data).map_err(RegistryError::Decode)
    }

    /// Write the newest `limit` records, most recent first.
    ///
    /// Returns the number of records written.
    pub fn write_recovery<'a, I>(&self, records: I, limit: usize) -> RegistryResult<usize>
    where
        I: IntoIterator<Item = &'a ErrorRecord>,
    {
        if limit == 0 {
            return Err(RegistryError::InvalidLimit(limit));
        }

        let selected = newest_first(records, limit);
        let data = serde_json::to_vec_pretty(&selected).map_err(RegistryError::Encode)?;
        atomic_write(&self.recovery_path, &data)?;

        debug!(
            path = %self.recovery_path.display(),
            records = selected.len(),
            limit,
            "wrote recovery snapshot"
        );
        Ok(selected.len())
    }

    /// Read the recovery snapshot in its stored (newest first) order
    pub fn load_recovery(&self) -> RegistryResult<Vec<ErrorRecord>> {
        let data = fs::read(&self.recovery_path)?;
        serde_json::from_slice(&data).map_err(RegistryError::Decode)
    }

    /// Recovery snapshot records whose type matches exactly
    pub fn load_recovery_by_type(&self, error_type: &str) -> RegistryResult<Vec<ErrorRecord>> {
        let mut records = self.load_recovery()?;
        records.retain(|r| r.error_type == error_type);
        Ok(records)
    }

    /// Drop temp files left behind by interrupted writes
    pub fn cleanup_temp_files(&self) -> RegistryResult<usize> {
        let mut cleaned = 0;
        for path in [&self.primary_path, &self.recovery_path] {
            if remove_stale_temp(path)? {
                cleaned += 1;
            }
        }
        Ok(cleaned)
    }
}

/// Up to `limit` records ordered newest first
pub fn newest_first<'a, I>(records: I, limit: usize) -> Vec<&'a ErrorRecord>
where
    I: IntoIterator<Item = &'a ErrorRecord>,
{
    let mut sorted: Vec<&ErrorRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.age_cmp(a));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorState, Severity};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(id: &str, error_type: &str, secs: i64) -> ErrorRecord {
        ErrorRecord::with_timestamp(
            id.to_string(),
            error_type.to_string(),
            format!("{} failed", id),
            Severity::Error,
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    fn manager(dir: &TempDir) -> SnapshotManager {
        SnapshotManager::new(
            dir.path().join("errors.json"),
            dir.path().join("recovery.json"),
        )
    }

    #[test]
    fn test_primary_round_trip() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);

        let mut records = RecordMap::new();
        let mut acked = record("e2", "net", 2);
        acked.acknowledge();
        records.insert("e1".to_string(), record("e1", "disk", 1));
        records.insert("e2".to_string(), acked);

        snapshots.write_primary(&records).unwrap();
        let loaded = snapshots.load_primary().unwrap();

        assert_eq!(loaded, records);
        assert_eq!(loaded["e2"].state, ErrorState::Acknowledged);
    }

    #[test]
    fn test_primary_is_human_readable_object() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);

        let mut records = RecordMap::new();
        records.insert("e1".to_string(), record("e1", "disk", 1));
        snapshots.write_primary(&records).unwrap();

        let text = fs::read_to_string(snapshots.primary_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["e1"]["type"], "disk");
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_recovery_keeps_newest_first() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);
        let records = vec![
            record("e1", "disk", 1),
            record("e3", "disk", 3),
            record("e2", "net", 2),
        ];

        let written = snapshots.write_recovery(&records, 2).unwrap();
        assert_eq!(written, 2);

        let loaded = snapshots.load_recovery().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e2"]);
    }

    #[test]
    fn test_recovery_rejects_zero_limit() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);

        let result = snapshots.write_recovery(&Vec::<ErrorRecord>::new(), 0);
        assert!(matches!(result, Err(RegistryError::InvalidLimit(0))));
        assert!(!snapshots.recovery_path().exists());
    }

    #[test]
    fn test_recovery_by_type() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);
        let records = vec![record("e1", "disk", 1), record("e2", "net", 2)];
        snapshots.write_recovery(&records, 10).unwrap();

        let disk = snapshots.load_recovery_by_type("disk").unwrap();
        assert_eq!(disk.len(), 1);
        assert_eq!(disk[0].id, "e1");
        assert!(snapshots.load_recovery_by_type("power").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_recovery_is_io_error() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);
        assert!(matches!(snapshots.load_recovery(), Err(RegistryError::Io(_))));
    }

    #[test]
    fn test_load_corrupt_recovery_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let snapshots = manager(&dir);
        fs::write(snapshots.recovery_path(), "not json").unwrap();
        assert!(matches!(
            snapshots.load_recovery(),
            Err(RegistryError::Decode(_))
        ));
    }
}
