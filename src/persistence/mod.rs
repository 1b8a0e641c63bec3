//! Persistence layer
//!
//! ```text
//! mutation ──► write_primary()   ──► <key>_errors.json   (id → record, always current)
//! maintenance ─► write_recovery() ──► <key>_recovery.json (newest N records)
//! ```

mod atomic;
mod snapshot;

pub use atomic::{atomic_write, remove_stale_temp, temp_path_for};
pub use snapshot::{newest_first, SnapshotManager};
