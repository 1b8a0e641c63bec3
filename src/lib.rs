//! Error Registry
//!
//! An in-process registry of operational error events for a host
//! application: bounded in size, mirrored to disk on every change, and
//! periodically rolled into a capped recovery snapshot.
//!
//! # Features
//!
//! - **Bounded**: at capacity the oldest record is evicted before an insert
//! - **Thread-Safe**: one `parking_lot::Mutex` serializes every operation
//! - **Durable**: primary snapshot rewritten atomically after each mutation
//! - **Rolling window**: a maintenance task snapshots the newest records and
//!   clears memory on a timer
//!
//! # Modules
//!
//! - `types`: Record model (ErrorRecord, ErrorState, Severity)
//! - `registry`: The bounded store, its mutations and queries
//! - `persistence`: Primary and recovery snapshot files
//! - `maintenance`: Periodic snapshot-and-clear task
//! - `sink`: Receiver for severity-classified records
//! - `config`: Registry configuration
//! - `error`: Error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use error_registry::{ErrorRegistry, MaintenanceTask, RegistryConfig};
//!
//! # async fn run() -> error_registry::RegistryResult<()> {
//! let config = RegistryConfig::new("modbus", "/var/lib/app").with_max_size(500);
//! let registry = Arc::new(ErrorRegistry::new(config)?);
//!
//! registry.add("plc-7-timeout", "modbus", "read timed out")?;
//! registry.acknowledge("plc-7-timeout")?;
//!
//! let maintenance = MaintenanceTask::new(Arc::clone(&registry), Duration::from_secs(300), 10)?
//!     .spawn();
//! // ...
//! maintenance.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod maintenance;
pub mod persistence;
pub mod registry;
pub mod sink;
pub mod types;

// Re-export commonly used items at crate root
pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use maintenance::{run_once, MaintenanceHandle, MaintenanceTask};
pub use registry::{ErrorRegistry, RegistryStats};
pub use sink::{ErrorSink, NullSink, TracingSink};
pub use types::{ErrorRecord, ErrorState, RecordMap, Severity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
