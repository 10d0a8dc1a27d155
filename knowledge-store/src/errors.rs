//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for knowledge-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Embedding provider failure (network, non-200, bad body).
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// Provider quota exhaustion (HTTP 429 and friends).
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl StoreError {
    /// Whether the condition is expected to clear on its own, so a
    /// later attempt against the same input can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Provider(_) | StoreError::RateLimited(_) | StoreError::Qdrant(_)
        )
    }
}
