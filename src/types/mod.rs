//! Data types for the error registry
//!
//! This module contains the record model shared by the store, the
//! persistence layer and the queries.

mod record;
mod severity;

use std::collections::BTreeMap;

pub use record::{ErrorRecord, ErrorState};
pub use severity::Severity;

/// Records keyed by id, in id order
pub type RecordMap = BTreeMap<String, ErrorRecord>;
