//! Error record types

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Severity;

/// Lifecycle state of a record. Only ever moves from `Current` to `Acknowledged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorState {
    #[default]
    Current,
    Acknowledged,
}

/// A single tracked error event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub state: ErrorState,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    /// Create a record in the `Current` state stamped with the current time
    pub fn new(id: String, error_type: String, message: String, severity: Severity) -> Self {
        Self::with_timestamp(id, error_type, message, severity, Utc::now())
    }

    /// Create a record with an explicit creation time
    pub fn with_timestamp(
        id: String,
        error_type: String,
        message: String,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            error_type,
            state: ErrorState::Current,
            message,
            severity,
            timestamp,
        }
    }

    pub fn is_current(&self) -> bool {
        self.state == ErrorState::Current
    }

    /// Mark as acknowledged. Returns false if it already was.
    pub fn acknowledge(&mut self) -> bool {
        if self.state == ErrorState::Acknowledged {
            return false;
        }
        self.state = ErrorState::Acknowledged;
        true
    }

    /// Age ordering: older timestamps first, ties broken by id
    pub fn age_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}
