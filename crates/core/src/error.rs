// Error types for credential and record persistence

use thiserror::Error;

/// Errors surfaced by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (email, natural key)
    #[error("duplicate entry: {0}")]
    Duplicate(String),

    /// Backend failure (connection, query, decoding)
    #[error("storage failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn duplicate(what: impl Into<String>) -> Self {
        StoreError::Duplicate(what.into())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}
