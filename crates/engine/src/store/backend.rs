// Storage backend seam and the in-memory implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use folio_common::block::{Block, BlockDraft, BlockKind};
use folio_common::document::DocumentStructure;

use crate::error::StoreError;

/// Durable storage for blocks and document structures.
///
/// Blocks live in one partition per kind; each partition allocates its own
/// ids starting at 1. Calls are synchronous and short; callers hold the
/// backend lock only for the duration of one call.
pub trait BlockBackend: Send {
    /// Allocate the next id in the draft's kind partition and store the
    /// block with `version = 1` and both timestamps set to `now`.
    fn insert_block(&mut self, draft: &BlockDraft, now: DateTime<Utc>) -> Result<Block, StoreError>;

    /// Overwrite a stored block. Returns `false` if no row matched.
    fn update_block(&mut self, block: &Block) -> Result<bool, StoreError>;

    fn delete_block(&mut self, kind: BlockKind, id: i64) -> Result<bool, StoreError>;

    /// Every block of a document across all kind partitions, ordered by
    /// `(order, kind, id)`.
    fn load_document_blocks(&self, document_id: &str) -> Result<Vec<Block>, StoreError>;

    fn delete_document_blocks(&mut self, document_id: &str) -> Result<usize, StoreError>;

    fn count_document_blocks(&self, document_id: &str) -> Result<usize, StoreError>;

    fn load_structure(&self, document_id: &str) -> Result<Option<DocumentStructure>, StoreError>;

    fn save_structure(&mut self, structure: &DocumentStructure) -> Result<(), StoreError>;

    fn delete_structure(&mut self, document_id: &str) -> Result<bool, StoreError>;

    /// Ids of every document with a stored structure or at least one block.
    fn list_documents(&self) -> Result<Vec<String>, StoreError>;
}

pub type SharedBackend = Arc<Mutex<Box<dyn BlockBackend>>>;

pub fn shared(backend: impl BlockBackend + 'static) -> SharedBackend {
    Arc::new(Mutex::new(Box::new(backend)))
}

/// Run one call against the backend under its lock.
pub fn with_backend<T>(
    backend: &SharedBackend,
    call: impl FnOnce(&mut dyn BlockBackend) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let mut guard =
        backend.lock().map_err(|_| StoreError::Unavailable("block backend lock poisoned".into()))?;
    call(&mut **guard)
}

// ── In-memory backend ──────────────────────────────────────────────

/// Volatile backend for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blocks: BTreeMap<(BlockKind, i64), Block>,
    sequences: HashMap<BlockKind, i64>,
    structures: BTreeMap<String, DocumentStructure>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

fn sort_for_load(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| (a.order, a.kind(), a.id).cmp(&(b.order, b.kind(), b.id)));
}

impl BlockBackend for MemoryBackend {
    fn insert_block(&mut self, draft: &BlockDraft, now: DateTime<Utc>) -> Result<Block, StoreError> {
        let kind = draft.kind();
        let sequence = self.sequences.entry(kind).or_insert(0);
        *sequence += 1;
        let block = Block {
            id: *sequence,
            document_id: draft.document_id.clone(),
            order: draft.order,
            version: 1,
            created_at: now,
            updated_at: now,
            payload: draft.payload.clone(),
        };
        self.blocks.insert((kind, block.id), block.clone());
        Ok(block)
    }

    fn update_block(&mut self, block: &Block) -> Result<bool, StoreError> {
        match self.blocks.get_mut(&(block.kind(), block.id)) {
            Some(stored) => {
                *stored = block.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_block(&mut self, kind: BlockKind, id: i64) -> Result<bool, StoreError> {
        Ok(self.blocks.remove(&(kind, id)).is_some())
    }

    fn load_document_blocks(&self, document_id: &str) -> Result<Vec<Block>, StoreError> {
        let mut blocks: Vec<Block> =
            self.blocks.values().filter(|b| b.document_id == document_id).cloned().collect();
        sort_for_load(&mut blocks);
        Ok(blocks)
    }

    fn delete_document_blocks(&mut self, document_id: &str) -> Result<usize, StoreError> {
        let before = self.blocks.len();
        self.blocks.retain(|_, block| block.document_id != document_id);
        Ok(before - self.blocks.len())
    }

    fn count_document_blocks(&self, document_id: &str) -> Result<usize, StoreError> {
        Ok(self.blocks.values().filter(|b| b.document_id == document_id).count())
    }

    fn load_structure(&self, document_id: &str) -> Result<Option<DocumentStructure>, StoreError> {
        Ok(self.structures.get(document_id).cloned())
    }

    fn save_structure(&mut self, structure: &DocumentStructure) -> Result<(), StoreError> {
        self.structures.insert(structure.document_id.clone(), structure.clone());
        Ok(())
    }

    fn delete_structure(&mut self, document_id: &str) -> Result<bool, StoreError> {
        Ok(self.structures.remove(document_id).is_some())
    }

    fn list_documents(&self) -> Result<Vec<String>, StoreError> {
        let ids: BTreeSet<String> = self
            .structures
            .keys()
            .cloned()
            .chain(self.blocks.values().map(|b| b.document_id.clone()))
            .collect();
        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use folio_common::block::{HeadingBlock, TextBlock};
    use folio_common::document::timestamp_now;

    use super::*;

    #[test]
    fn each_kind_allocates_ids_independently() {
        let mut backend = MemoryBackend::new();
        let now = timestamp_now();
        let h1 = backend.insert_block(&BlockDraft::new("d", 0, HeadingBlock::new(1, "a")), now).unwrap();
        let t1 = backend.insert_block(&BlockDraft::new("d", 1, TextBlock::new("b")), now).unwrap();
        let t2 = backend.insert_block(&BlockDraft::new("d", 2, TextBlock::new("c")), now).unwrap();

        assert_eq!((h1.id, t1.id, t2.id), (1, 1, 2));
        assert_eq!(h1.reference().as_str(), "heading:1");
        assert_eq!(t1.reference().as_str(), "text:1");
        assert_eq!(h1.version, 1);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let mut backend = MemoryBackend::new();
        let now = timestamp_now();
        let first = backend.insert_block(&BlockDraft::new("d", 0, TextBlock::new("a")), now).unwrap();
        assert!(backend.delete_block(BlockKind::Text, first.id).unwrap());
        let second = backend.insert_block(&BlockDraft::new("d", 0, TextBlock::new("b")), now).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn load_filters_by_document_and_sorts_by_order() {
        let mut backend = MemoryBackend::new();
        let now = timestamp_now();
        backend.insert_block(&BlockDraft::new("d1", 5, TextBlock::new("late")), now).unwrap();
        backend.insert_block(&BlockDraft::new("d2", 0, TextBlock::new("other")), now).unwrap();
        backend.insert_block(&BlockDraft::new("d1", 1, HeadingBlock::new(1, "early")), now).unwrap();

        let blocks = backend.load_document_blocks("d1").unwrap();
        let orders: Vec<i64> = blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![1, 5]);
        assert_eq!(backend.count_document_blocks("d2").unwrap(), 1);
        assert_eq!(backend.list_documents().unwrap(), vec!["d1".to_string(), "d2".to_string()]);
    }

    #[test]
    fn update_of_missing_block_reports_false() {
        let mut backend = MemoryBackend::new();
        let now = timestamp_now();
        let block = backend.insert_block(&BlockDraft::new("d", 0, TextBlock::new("a")), now).unwrap();
        backend.delete_block(BlockKind::Text, block.id).unwrap();
        assert!(!backend.update_block(&block).unwrap());
    }
}
