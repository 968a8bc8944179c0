// Per-document structure record: reading order, version, last-modified.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::block::BlockRef;

/// Current time truncated to the microsecond precision records persist with.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Ordering and membership of one document's blocks.
///
/// `block_order` is the reading order. It never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub document_id: String,
    pub block_order: Vec<BlockRef>,
    pub version: u64,
    pub last_modified: DateTime<Utc>,
}

impl DocumentStructure {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            block_order: Vec::new(),
            version: 1,
            last_modified: timestamp_now(),
        }
    }

    pub fn contains(&self, reference: &BlockRef) -> bool {
        self.block_order.contains(reference)
    }

    pub fn is_empty(&self) -> bool {
        self.block_order.is_empty()
    }

    /// Record a mutation. `last_modified` strictly advances even when the
    /// clock has not moved since the previous bump.
    pub fn bump(&mut self) {
        self.version += 1;
        let floor = self.last_modified + Duration::microseconds(1);
        self.last_modified = timestamp_now().max(floor);
    }

    /// Replace the order, keeping only the first occurrence of each reference.
    pub fn set_order(&mut self, order: impl IntoIterator<Item = BlockRef>) {
        let mut seen = HashSet::new();
        self.block_order =
            order.into_iter().filter(|reference| seen.insert(reference.clone())).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_structure_is_empty_at_version_one() {
        let structure = DocumentStructure::new("doc-1");
        assert!(structure.is_empty());
        assert_eq!(structure.version, 1);
    }

    #[test]
    fn bump_strictly_advances_version_and_time() {
        let mut structure = DocumentStructure::new("doc-1");
        let mut previous = structure.last_modified;
        for expected in 2..10 {
            structure.bump();
            assert_eq!(structure.version, expected);
            assert!(structure.last_modified > previous);
            previous = structure.last_modified;
        }
    }

    #[test]
    fn set_order_handles_long_orders_with_repeats() {
        let mut structure = DocumentStructure::new("doc-1");
        let refs: Vec<BlockRef> =
            (0..20_000).map(|i| BlockRef::from(format!("text:{}", i % 10_000).as_str())).collect();
        structure.set_order(refs);
        assert_eq!(structure.block_order.len(), 10_000);
        assert_eq!(structure.block_order[0], BlockRef::from("text:0"));
        assert_eq!(structure.block_order[9_999], BlockRef::from("text:9999"));
    }

    #[test]
    fn set_order_collapses_duplicates_to_first_occurrence() {
        let mut structure = DocumentStructure::new("doc-1");
        structure.set_order(["text:2", "text:1", "text:2", "heading:1"].map(BlockRef::from));
        assert_eq!(
            structure.block_order,
            ["text:2", "text:1", "heading:1"].map(BlockRef::from).to_vec()
        );
    }

    #[test]
    fn timestamps_have_microsecond_precision() {
        let now = timestamp_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
