//! Registry error taxonomy

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by the registry, its persistence layer and the maintenance task
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("error message is {len} bytes, exceeds the maximum of {max}")]
    MessageTooLarge { len: usize, max: usize },

    #[error("registry is at capacity but holds no record to evict")]
    EvictionImpossible,

    #[error("error not found: {0}")]
    NotFound(String),

    #[error("retention limit must be greater than zero, got {0}")]
    InvalidLimit(usize),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}
