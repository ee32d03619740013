//! Engine error taxonomy.
//!
//! Every variant is reported to the caller. Per-row data problems are not
//! errors: ingestion records them as `SkippedSample`s instead.

use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("insufficient data: need at least {required} price points, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidParameter(msg.into())
    }
}
