//! Mutating operations on the registry
//!
//! Each operation validates first, so a rejected call leaves the records
//! untouched, then mutates and mirrors the result to the primary snapshot
//! while still holding the lock.

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ErrorRecord, Severity};

use super::{ErrorRegistry, RegistryState};

/// Add a record, evicting the oldest one if the registry is full
pub fn add(
    registry: &ErrorRegistry,
    id: &str,
    error_type: &str,
    message: &str,
) -> RegistryResult<ErrorRecord> {
    let mut state = registry.state.lock();

    if id.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "error id cannot be empty".to_string(),
        ));
    }

    let max = registry.config.max_message_size;
    if message.len() > max {
        return Err(RegistryError::MessageTooLarge {
            len: message.len(),
            max,
        });
    }

    // Re-adding an existing id replaces it in place and needs no room
    if !state.records.contains_key(id) && state.records.len() >= registry.config.max_size {
        let evicted = evict_oldest(&mut state)?;
        debug!(
            key = %registry.config.key,
            evicted = %evicted.id,
            "registry full, evicted oldest error"
        );
    }

    let record = ErrorRecord::new(
        id.to_string(),
        error_type.to_string(),
        message.to_string(),
        state.severity,
    );
    state.records.insert(record.id.clone(), record.clone());

    registry.sink.record_added(&registry.config.key, &record);
    registry.persist(&state);

    Ok(record)
}

/// Remove the record with the smallest `(timestamp, id)`
fn evict_oldest(state: &mut RegistryState) -> RegistryResult<ErrorRecord> {
    let oldest_id = state
        .records
        .values()
        .min_by(|a, b| a.age_cmp(b))
        .map(|r| r.id.clone())
        .ok_or(RegistryError::EvictionImpossible)?;

    let evicted = state
        .records
        .remove(&oldest_id)
        .ok_or(RegistryError::EvictionImpossible)?;
    state.evicted_count += 1;
    Ok(evicted)
}

/// Delete a record by id
pub fn delete(registry: &ErrorRegistry, id: &str) -> RegistryResult<()> {
    let mut state = registry.state.lock();

    if state.records.remove(id).is_none() {
        return Err(RegistryError::NotFound(id.to_string()));
    }

    registry.persist(&state);
    Ok(())
}

/// Move a record to `Acknowledged`. Acknowledging twice is a no-op.
pub fn acknowledge(registry: &ErrorRegistry, id: &str) -> RegistryResult<()> {
    let mut state = registry.state.lock();

    let record = state
        .records
        .get_mut(id)
        .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
    record.acknowledge();

    registry.persist(&state);
    Ok(())
}

/// Remove every record and mirror the empty set
pub fn clear_all(registry: &ErrorRegistry) {
    let mut state = registry.state.lock();
    state.records.clear();
    registry.persist(&state);
}

/// Change the severity given to records created from now on
pub fn set_severity(registry: &ErrorRegistry, severity: Severity) {
    registry.state.lock().severity = severity;
}
