// Block repository: typed CRUD over block records.
//
// Every mutation writes through to the backend before the cache is touched.
// The cache is one arena per document, created on first access and dropped
// by `evict_document`, plus a reference → document index for lookups.

use std::collections::HashMap;

use folio_common::block::{Block, BlockDraft, BlockPatch, BlockRef};
use folio_common::document::timestamp_now;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{BlockError, BlockResult};
use crate::store::{with_backend, SharedBackend};

#[derive(Default)]
struct BlockCache {
    arenas: HashMap<String, HashMap<BlockRef, Block>>,
    owners: HashMap<BlockRef, String>,
}

impl BlockCache {
    fn insert(&mut self, block: Block) {
        let reference = block.reference();
        self.owners.insert(reference.clone(), block.document_id.clone());
        self.arenas.entry(block.document_id.clone()).or_default().insert(reference, block);
    }

    fn get(&self, reference: &BlockRef) -> Option<&Block> {
        let document_id = self.owners.get(reference)?;
        self.arenas.get(document_id)?.get(reference)
    }

    fn remove(&mut self, reference: &BlockRef) -> Option<Block> {
        let document_id = self.owners.remove(reference)?;
        self.arenas.get_mut(&document_id)?.remove(reference)
    }

    fn replace_arena(&mut self, document_id: &str, blocks: &[Block]) {
        self.evict(document_id);
        let arena = self.arenas.entry(document_id.to_string()).or_default();
        for block in blocks {
            let reference = block.reference();
            self.owners.insert(reference.clone(), document_id.to_string());
            arena.insert(reference, block.clone());
        }
    }

    fn evict(&mut self, document_id: &str) -> bool {
        match self.arenas.remove(document_id) {
            Some(arena) => {
                for reference in arena.keys() {
                    self.owners.remove(reference);
                }
                true
            }
            None => false,
        }
    }
}

pub struct BlockRepository {
    backend: SharedBackend,
    cache: RwLock<BlockCache>,
}

impl BlockRepository {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend, cache: RwLock::new(BlockCache::default()) }
    }

    /// Store a new block with the next id of its kind partition.
    ///
    /// Payload validation failures are logged; the block is stored anyway.
    pub async fn create_block(&self, draft: BlockDraft) -> BlockResult<Block> {
        if let Err(error) = draft.payload.validate() {
            warn!(
                document_id = %draft.document_id,
                kind = %draft.kind(),
                %error,
                "storing block that failed validation"
            );
        }

        let now = timestamp_now();
        let block = with_backend(&self.backend, |backend| backend.insert_block(&draft, now))?;
        debug!(document_id = %block.document_id, block = %block.reference(), "created block");

        self.cache.write().await.insert(block.clone());
        Ok(block)
    }

    /// Merge a patch into a cached block and write it through.
    ///
    /// The merged payload must deserialize as the same kind; otherwise the
    /// block is left untouched and `Validation` is returned.
    pub async fn update_block(&self, reference: &BlockRef, patch: &BlockPatch) -> BlockResult<Block> {
        let mut cache = self.cache.write().await;
        let current = cache.get(reference).ok_or_else(|| BlockError::NotFound(reference.clone()))?;

        let payload = if patch.fields.is_empty() {
            current.payload.clone()
        } else {
            current.payload.merge_fields(&patch.fields)?
        };
        let updated = Block {
            order: patch.order.unwrap_or(current.order),
            version: current.version + 1,
            updated_at: timestamp_now().max(current.updated_at),
            payload,
            ..current.clone()
        };

        let stored = with_backend(&self.backend, |backend| backend.update_block(&updated))?;
        if !stored {
            warn!(block = %reference, "cached block had no stored row, update not persisted");
            return Err(BlockError::NotFound(reference.clone()));
        }
        debug!(block = %reference, version = updated.version, "updated block");

        cache.insert(updated.clone());
        Ok(updated)
    }

    /// Remove a cached block from the store and the cache.
    ///
    /// Returns whether the store held a row for it.
    pub async fn delete_block(&self, reference: &BlockRef) -> BlockResult<bool> {
        let mut cache = self.cache.write().await;
        let block = cache.get(reference).ok_or_else(|| BlockError::NotFound(reference.clone()))?;
        let (kind, id) = (block.kind(), block.id);

        let deleted = with_backend(&self.backend, |backend| backend.delete_block(kind, id))?;
        cache.remove(reference);
        debug!(block = %reference, deleted, "deleted block");
        Ok(deleted)
    }

    pub async fn get_block(&self, reference: &BlockRef) -> Option<Block> {
        self.cache.read().await.get(reference).cloned()
    }

    /// Document that owns a cached block.
    pub async fn owner_of(&self, reference: &BlockRef) -> Option<String> {
        self.cache.read().await.owners.get(reference).cloned()
    }

    /// Bulk-read every stored block of a document and make it the
    /// document's arena, replacing whatever was cached before.
    pub async fn load_all_blocks_for_document(&self, document_id: &str) -> BlockResult<Vec<Block>> {
        let blocks =
            with_backend(&self.backend, |backend| backend.load_document_blocks(document_id))?;
        self.cache.write().await.replace_arena(document_id, &blocks);
        debug!(document_id, count = blocks.len(), "loaded document blocks");
        Ok(blocks)
    }

    pub async fn is_loaded(&self, document_id: &str) -> bool {
        self.cache.read().await.arenas.contains_key(document_id)
    }

    /// Cached blocks of a document, ordered by `(order, kind, id)`.
    pub async fn document_blocks(&self, document_id: &str) -> Vec<Block> {
        let cache = self.cache.read().await;
        let mut blocks: Vec<Block> = cache
            .arenas
            .get(document_id)
            .map(|arena| arena.values().cloned().collect())
            .unwrap_or_default();
        blocks.sort_by(|a, b| (a.order, a.kind(), a.id).cmp(&(b.order, b.kind(), b.id)));
        blocks
    }

    pub async fn evict_document(&self, document_id: &str) -> bool {
        self.cache.write().await.evict(document_id)
    }

    /// Delete every stored block of a document, referenced or not, and
    /// drop its arena.
    pub async fn delete_document_blocks(&self, document_id: &str) -> BlockResult<usize> {
        let deleted =
            with_backend(&self.backend, |backend| backend.delete_document_blocks(document_id))?;
        self.cache.write().await.evict(document_id);
        Ok(deleted)
    }

    pub async fn persisted_block_count(&self, document_id: &str) -> BlockResult<usize> {
        Ok(with_backend(&self.backend, |backend| backend.count_document_blocks(document_id))?)
    }
}

#[cfg(test)]
mod tests {
    use folio_common::block::{BlockPayload, HeadingBlock, ImageBlock, TextBlock, ValidationError};

    use super::*;
    use crate::store::{shared, MemoryBackend};

    fn repository() -> BlockRepository {
        BlockRepository::new(shared(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn create_assigns_version_one_and_caches() {
        let repo = repository();
        let block = repo.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("hi"))).await.unwrap();

        assert_eq!(block.version, 1);
        assert_eq!(block.created_at, block.updated_at);
        assert_eq!(repo.get_block(&block.reference()).await, Some(block.clone()));
        assert_eq!(repo.owner_of(&block.reference()).await.as_deref(), Some("doc-1"));
    }

    #[tokio::test]
    async fn invalid_draft_is_still_stored() {
        let repo = repository();
        let block = repo
            .create_block(BlockDraft::new("doc-1", 0, ImageBlock::default()))
            .await
            .expect("validation failures are logged, not returned");
        assert_eq!(repo.persisted_block_count("doc-1").await.unwrap(), 1);
        assert!(repo.get_block(&block.reference()).await.is_some());
    }

    #[tokio::test]
    async fn update_merges_fields_and_bumps_version() {
        let repo = repository();
        let block =
            repo.create_block(BlockDraft::new("doc-1", 0, HeadingBlock::new(1, "Intro"))).await.unwrap();

        let patch = BlockPatch::new().order(4).set("text", "Overview");
        let updated = repo.update_block(&block.reference(), &patch).await.unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.order, 4);
        assert_eq!(updated.payload, BlockPayload::from(HeadingBlock::new(1, "Overview")));
        assert!(updated.updated_at >= block.updated_at);
        assert_eq!(updated.created_at, block.created_at);
    }

    #[tokio::test]
    async fn update_rejects_invalid_patch_and_keeps_block() {
        let repo = repository();
        let block = repo.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();

        let error = repo
            .update_block(&block.reference(), &BlockPatch::new().set("kind", "heading"))
            .await
            .unwrap_err();
        assert!(matches!(error, BlockError::Validation(ValidationError::InvalidPatch { .. })));
        assert_eq!(repo.get_block(&block.reference()).await, Some(block));
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_reference_are_not_found() {
        let repo = repository();
        let missing = BlockRef::from("text:42");
        assert!(matches!(
            repo.update_block(&missing, &BlockPatch::new()).await,
            Err(BlockError::NotFound(_))
        ));
        assert!(matches!(repo.delete_block(&missing).await, Err(BlockError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_from_cache_and_store() {
        let repo = repository();
        let block = repo.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();

        assert!(repo.delete_block(&block.reference()).await.unwrap());
        assert!(repo.get_block(&block.reference()).await.is_none());
        assert_eq!(repo.persisted_block_count("doc-1").await.unwrap(), 0);
        assert!(matches!(repo.delete_block(&block.reference()).await, Err(BlockError::NotFound(_))));
    }

    #[tokio::test]
    async fn load_replaces_arena_with_stored_blocks() {
        let backend = shared(MemoryBackend::new());
        let writer = BlockRepository::new(backend.clone());
        writer.create_block(BlockDraft::new("doc-1", 1, TextBlock::new("b"))).await.unwrap();
        writer.create_block(BlockDraft::new("doc-1", 0, HeadingBlock::new(2, "a"))).await.unwrap();
        writer.create_block(BlockDraft::new("doc-2", 0, TextBlock::new("other"))).await.unwrap();

        let reader = BlockRepository::new(backend);
        assert!(!reader.is_loaded("doc-1").await);
        let loaded = reader.load_all_blocks_for_document("doc-1").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(reader.is_loaded("doc-1").await);
        assert_eq!(reader.document_blocks("doc-1").await, loaded);
        assert!(reader.get_block(&BlockRef::from("text:2")).await.is_none());
    }

    #[tokio::test]
    async fn evict_drops_arena_and_owner_index() {
        let repo = repository();
        let block = repo.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();

        assert!(repo.evict_document("doc-1").await);
        assert!(repo.get_block(&block.reference()).await.is_none());
        assert!(repo.owner_of(&block.reference()).await.is_none());
        assert!(!repo.evict_document("doc-1").await);
        assert_eq!(repo.persisted_block_count("doc-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_document_blocks_cascades() {
        let repo = repository();
        repo.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();
        repo.create_block(BlockDraft::new("doc-1", 1, TextBlock::new("b"))).await.unwrap();
        repo.create_block(BlockDraft::new("doc-2", 0, TextBlock::new("c"))).await.unwrap();

        assert_eq!(repo.delete_document_blocks("doc-1").await.unwrap(), 2);
        assert!(repo.document_blocks("doc-1").await.is_empty());
        assert_eq!(repo.persisted_block_count("doc-2").await.unwrap(), 1);
    }
}
