//! Registry configuration
//!
//! Capacity, message ceiling and snapshot paths are fixed for the lifetime
//! of a registry. The host binary also reads the maintenance settings from
//! here.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RegistryError, RegistryResult};
use crate::types::Severity;

/// Default number of records kept in the recovery snapshot
pub const DEFAULT_RETENTION_LIMIT: usize = 10;

/// Default maintenance interval
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for an `ErrorRegistry`
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Name of this registry instance
    pub key: String,
    /// Maximum number of records held in memory
    pub max_size: usize,
    /// Maximum message length in bytes
    pub max_message_size: usize,
    /// Severity assigned to newly created records
    pub severity: Severity,
    /// File mirrored after every mutation
    pub primary_snapshot_path: PathBuf,
    /// File written by the maintenance task and read by disk queries
    pub recovery_snapshot_path: PathBuf,
    /// Records kept per recovery snapshot
    pub retention_limit: usize,
    /// Time between maintenance ticks
    pub maintenance_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new("default", "data")
    }
}

impl RegistryConfig {
    /// Create config for `key` with both snapshots under `data_dir`
    pub fn new<P: AsRef<Path>>(key: &str, data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            key: key.to_string(),
            max_size: 1000,
            max_message_size: 4096,
            severity: Severity::Error,
            primary_snapshot_path: data_dir.join(format!("{}_errors.json", key)),
            recovery_snapshot_path: data_dir.join(format!("{}_recovery.json", key)),
            retention_limit: DEFAULT_RETENTION_LIMIT,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_primary_snapshot_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.primary_snapshot_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_recovery_snapshot_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.recovery_snapshot_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.retention_limit = limit;
        self
    }

    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Build a config from `ERROR_REGISTRY_*` environment variables.
    ///
    /// Unset variables keep their defaults. Relative paths are resolved
    /// against the current working directory.
    pub fn from_env() -> RegistryResult<Self> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let key = env::var("ERROR_REGISTRY_KEY").unwrap_or_else(|_| "default".to_string());
        let mut config = Self::new(&key, &current_dir);

        if let Some(max_size) = parse_var("ERROR_REGISTRY_MAX_SIZE")? {
            config.max_size = max_size;
        }
        if let Some(max_message_size) = parse_var("ERROR_REGISTRY_MAX_MESSAGE_SIZE")? {
            config.max_message_size = max_message_size;
        }
        if let Some(severity) = parse_var::<Severity>("ERROR_REGISTRY_SEVERITY")? {
            config.severity = severity;
        }
        if let Ok(path) = env::var("ERROR_REGISTRY_PRIMARY_PATH") {
            config.primary_snapshot_path = resolve(&current_dir, &path);
        }
        if let Ok(path) = env::var("ERROR_REGISTRY_RECOVERY_PATH") {
            config.recovery_snapshot_path = resolve(&current_dir, &path);
        }
        if let Some(limit) = parse_var("ERROR_REGISTRY_RETENTION_LIMIT")? {
            config.retention_limit = limit;
        }
        if let Some(secs) = parse_var::<u64>("ERROR_REGISTRY_INTERVAL_SECS")? {
            config.maintenance_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Check the invariants a registry relies on
    pub fn validate(&self) -> RegistryResult<()> {
        if self.key.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "registry key cannot be empty".to_string(),
            ));
        }
        if self.max_size == 0 {
            return Err(RegistryError::InvalidArgument(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(RegistryError::InvalidArgument(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        if self.primary_snapshot_path == self.recovery_snapshot_path {
            return Err(RegistryError::InvalidArgument(
                "primary and recovery snapshots must use different files".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str) -> RegistryResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            RegistryError::InvalidArgument(format!("{} has an invalid value: {}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        base.join(path)
    }
}
