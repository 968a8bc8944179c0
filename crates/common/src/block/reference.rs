// Composite block references: `"<kind>:<id>"`.
//
// Every kind keeps its own auto-incrementing id partition, so two blocks of
// different kinds can share a numeric id. The kind prefix disambiguates them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BlockKind;

/// Separator between the kind tag and the kind-local id.
pub const REF_DELIMITER: char = ':';

/// A key into the block repository.
///
/// Structures persisted before the composite scheme hold bare numeric ids,
/// so a `BlockRef` is not guaranteed to be composite. Use [`BlockRef::parse`]
/// to resolve it; legacy values parse to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockRef(String);

impl BlockRef {
    /// Wrap a raw reference string without checking its shape.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_composite(&self) -> bool {
        is_composite(&self.0)
    }

    pub fn parse(&self) -> Option<(BlockKind, i64)> {
        parse_ref(&self.0)
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.parse().map(|(kind, _)| kind)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlockRef {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for BlockRef {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

pub fn make_ref(kind: BlockKind, id: i64) -> BlockRef {
    BlockRef(format!("{}{REF_DELIMITER}{id}", kind.as_str()))
}

/// Split a reference into its kind and kind-local id.
///
/// Returns `None` for anything that is not a well-formed composite
/// reference: no delimiter, an unknown kind tag, or a non-integer id.
pub fn parse_ref(value: &str) -> Option<(BlockKind, i64)> {
    let (kind, id) = value.split_once(REF_DELIMITER)?;
    let kind = BlockKind::from_tag(kind)?;
    let id = id.parse().ok()?;
    Some((kind, id))
}

pub fn is_composite(value: &str) -> bool {
    value.contains(REF_DELIMITER)
}
