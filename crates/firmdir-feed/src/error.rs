//! Error types for the firmdir-feed crate.

use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors raised while fetching or parsing the PDA feed.
///
/// Any of these means "no valid snapshot": the reconciliation pass is
/// aborted before touching the store.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Remote endpoint could not be reached or returned an error status.
    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local feed file could not be read.
    #[error("Feed file unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON or does not match the wire format.
    #[error("Feed document malformed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document parsed but violates a feed invariant.
    #[error("Feed validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = FeedError::Validation("duplicate office O001 for firm F001".to_string());
        assert!(err.to_string().contains("duplicate office"));
    }
}
