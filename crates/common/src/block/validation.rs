use thiserror::Error;

use super::BlockKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} block is missing required field `{field}`")]
    MissingField { kind: BlockKind, field: &'static str },

    #[error("heading level must be between 1 and 6, got {0}")]
    HeadingLevel(u8),

    #[error("table row {row} has {width} cells but only {headers} headers")]
    RaggedTableRow { row: usize, width: usize, headers: usize },

    #[error("tree root must be a `document` node, got `{0}`")]
    UnexpectedRoot(String),

    #[error("patch for {kind} block is invalid: {reason}")]
    InvalidPatch { kind: BlockKind, reason: String },
}
