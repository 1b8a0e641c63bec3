//! Error sinks
//!
//! Every new record is handed to an `ErrorSink` together with the severity
//! it was classified under, and so is any snapshot write that failed as a
//! side effect of a mutation. The registry logs those failures itself.

use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::types::{ErrorRecord, Severity};

/// Receiver for record notifications and best-effort persistence failures
pub trait ErrorSink: Send + Sync {
    /// Called once per successful `add`, with the lock held
    fn record_added(&self, registry_key: &str, record: &ErrorRecord);

    /// Called when a snapshot write failed but the in-memory change stands
    fn persistence_failed(&self, _registry_key: &str, _error: &RegistryError) {}
}

/// Forwards records to `tracing` at the level matching their severity
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn record_added(&self, registry_key: &str, record: &ErrorRecord) {
        if !record.severity.is_enabled() {
            return;
        }

        let (key, id, error_type, error_message) = (
            registry_key,
            record.id.as_str(),
            record.error_type.as_str(),
            record.message.as_str(),
        );
        match record.severity {
            Severity::Info => info!(key, id, error_type, error_message, "added new error"),
            Severity::Debug => debug!(key, id, error_type, error_message, "added new error"),
            Severity::Error => error!(key, id, error_type, error_message, "added new error"),
            Severity::Warning => warn!(key, id, error_type, error_message, "added new error"),
            Severity::Disabled => {}
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn record_added(&self, _registry_key: &str, _record: &ErrorRecord) {}
}
