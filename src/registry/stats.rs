//! Registry statistics

use std::collections::BTreeMap;

use crate::types::{ErrorState, Severity};

use super::ErrorRegistry;

/// Point-in-time counters for one registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryStats {
    pub key: String,
    /// Records currently held
    pub size: usize,
    pub max_size: usize,
    /// Records removed to make room since the registry was created
    pub evicted_count: u64,
    pub current_count: usize,
    pub acknowledged_count: usize,
    /// Record count per error type
    pub by_type: BTreeMap<String, usize>,
    pub severity: Severity,
}

impl RegistryStats {
    pub fn is_full(&self) -> bool {
        self.size >= self.max_size
    }

    /// Fraction of capacity in use, 0.0 to 1.0
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            return 0.0;
        }
        self.size as f64 / self.max_size as f64
    }
}

pub fn collect(registry: &ErrorRegistry) -> RegistryStats {
    let state = registry.state.lock();

    let mut stats = RegistryStats {
        key: registry.config.key.clone(),
        size: state.records.len(),
        max_size: registry.config.max_size,
        evicted_count: state.evicted_count,
        severity: state.severity,
        ..Default::default()
    };

    for record in state.records.values() {
        match record.state {
            ErrorState::Current => stats.current_count += 1,
            ErrorState::Acknowledged => stats.acknowledged_count += 1,
        }
        *stats.by_type.entry(record.error_type.clone()).or_insert(0) += 1;
    }

    stats
}
