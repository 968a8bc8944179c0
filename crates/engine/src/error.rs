// Error types for block and structure operations.

use folio_common::block::{BlockRef, ValidationError};
use thiserror::Error;

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row in `{table}`: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block not found: {0}")]
    NotFound(BlockRef),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

pub type BlockResult<T> = Result<T, BlockError>;
