//! In-memory query operations
//!
//! All views are cloned out from under the registry lock.

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ErrorRecord, RecordMap};

use super::ErrorRegistry;

/// Every record currently held
pub fn get_all(registry: &ErrorRegistry) -> RecordMap {
    registry.state.lock().records.clone()
}

/// Records whose type matches exactly
pub fn get_by_type(registry: &ErrorRegistry, error_type: &str) -> RecordMap {
    filter(registry, |r| r.error_type == error_type)
}

/// Records that have not been acknowledged
pub fn get_current(registry: &ErrorRegistry) -> RecordMap {
    filter(registry, ErrorRecord::is_current)
}

pub fn get(registry: &ErrorRegistry, id: &str) -> Option<ErrorRecord> {
    registry.state.lock().records.get(id).cloned()
}

/// Pretty JSON of the in-memory records, same shape as the primary snapshot
pub fn json_dump(registry: &ErrorRegistry) -> RegistryResult<String> {
    let state = registry.state.lock();
    serde_json::to_string_pretty(&state.records).map_err(RegistryError::Encode)
}

fn filter<F>(registry: &ErrorRegistry, predicate: F) -> RecordMap
where
    F: Fn(&ErrorRecord) -> bool,
{
    let state = registry.state.lock();
    state
        .records
        .iter()
        .filter(|&(_, r)| predicate(r))
        .map(|(id, r)| (id.clone(), r.clone()))
        .collect()
}
