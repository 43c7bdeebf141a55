//! Error types for the reconciliation engines.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the comparison and synchronization engines.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The directory store failed.
    #[error("directory store failure: {0}")]
    Store(#[from] StoreError),

    /// The snapshot violated an invariant the feed layer should have caught.
    #[error("snapshot inconsistency: {0}")]
    Inconsistent(String),
}
