// Block engine: the calls the editor and the CLI make against a document.
//
// Composes the repository, the structure index, import and migration over
// one shared backend. A document's blocks are loaded into the repository
// the first time any call touches the document.

use std::path::Path;

use anyhow::{Context, Result};
use folio_common::block::{Block, BlockDraft, BlockPatch, BlockRef, HeadingBlock};
use folio_common::convert::tree_from_blocks;
use folio_common::document::DocumentStructure;
use folio_common::tree::TreeNode;
use tracing::{debug, info};

use crate::config::FolioConfig;
use crate::error::{BlockError, BlockResult};
use crate::import::{self, ImportReport};
use crate::migration;
use crate::repository::BlockRepository;
use crate::store::{shared, BlockBackend, MemoryBackend, SqliteBackend};
use crate::structure::StructureIndex;

pub const DEFAULT_TITLE: &str = "Untitled";

pub struct BlockEngine {
    repository: BlockRepository,
    structures: StructureIndex,
    default_title: String,
}

impl BlockEngine {
    pub fn new(backend: impl BlockBackend + 'static) -> Self {
        let backend = shared(backend);
        Self {
            repository: BlockRepository::new(backend.clone()),
            structures: StructureIndex::new(backend),
            default_title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open a SQLite-backed engine at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let backend = SqliteBackend::open(path)
            .with_context(|| format!("failed to open block store at `{}`", path.display()))?;
        Ok(Self::new(backend))
    }

    pub fn from_config(config: &FolioConfig) -> Result<Self> {
        Ok(Self::open(&config.database_path)?
            .with_default_title(config.documents.default_title.clone()))
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn repository(&self) -> &BlockRepository {
        &self.repository
    }

    pub fn structures(&self) -> &StructureIndex {
        &self.structures
    }

    // ── Loading ────────────────────────────────────────────────────

    /// Bulk-load a document's blocks, then upgrade a legacy structure if
    /// one is found.
    pub async fn load_document_blocks(&self, document_id: &str) -> BlockResult<Vec<Block>> {
        let blocks = self.repository.load_all_blocks_for_document(document_id).await?;
        migration::migrate_if_needed(document_id, &self.repository, &self.structures).await?;
        Ok(blocks)
    }

    async fn ensure_loaded(&self, document_id: &str) -> BlockResult<()> {
        if !self.repository.is_loaded(document_id).await {
            self.load_document_blocks(document_id).await?;
        }
        Ok(())
    }

    // ── Tree boundary ──────────────────────────────────────────────

    /// Render the document as an editor tree. `None` when no block of the
    /// structure resolves.
    pub async fn get_tree(&self, document_id: &str) -> BlockResult<Option<TreeNode>> {
        let blocks = self.get_ordered_blocks(document_id).await?;
        if blocks.is_empty() {
            debug!(document_id, "document has no resolvable blocks");
            return Ok(None);
        }
        Ok(Some(tree_from_blocks(blocks.iter().map(|block| &block.payload))))
    }

    pub async fn import_tree(&self, document_id: &str, tree: &TreeNode) -> BlockResult<ImportReport> {
        self.ensure_loaded(document_id).await?;
        import::import_tree(document_id, tree, &self.repository, &self.structures).await
    }

    // ── Block edits ────────────────────────────────────────────────

    /// Store a block and append its reference to the document.
    pub async fn create_block(&self, draft: BlockDraft) -> BlockResult<Block> {
        let document_id = draft.document_id.clone();
        self.ensure_loaded(&document_id).await?;
        let block = self.repository.create_block(draft).await?;
        self.structures.append_ref(&document_id, block.reference()).await?;
        Ok(block)
    }

    pub async fn update_block(&self, reference: &BlockRef, patch: &BlockPatch) -> BlockResult<Block> {
        let block = self.repository.update_block(reference, patch).await?;
        self.structures.touch(&block.document_id).await?;
        Ok(block)
    }

    /// Delete a block and drop its reference from the document.
    pub async fn delete_block(&self, reference: &BlockRef) -> BlockResult<bool> {
        let document_id = self
            .repository
            .owner_of(reference)
            .await
            .ok_or_else(|| BlockError::NotFound(reference.clone()))?;
        let deleted = self.repository.delete_block(reference).await?;
        self.structures.remove_ref(&document_id, reference).await?;
        Ok(deleted)
    }

    pub async fn get_block(&self, reference: &BlockRef) -> Option<Block> {
        self.repository.get_block(reference).await
    }

    // ── Structure ──────────────────────────────────────────────────

    pub async fn reorder(
        &self,
        document_id: &str,
        new_order: Vec<BlockRef>,
    ) -> BlockResult<DocumentStructure> {
        self.ensure_loaded(document_id).await?;
        self.structures.reorder(document_id, new_order).await
    }

    /// Resolved blocks sorted by their `order` field.
    pub async fn get_ordered_blocks(&self, document_id: &str) -> BlockResult<Vec<Block>> {
        self.ensure_loaded(document_id).await?;
        self.structures.get_ordered_blocks(document_id, &self.repository).await
    }

    pub async fn structure(&self, document_id: &str) -> BlockResult<DocumentStructure> {
        self.ensure_loaded(document_id).await?;
        self.structures.ensure_structure(document_id).await
    }

    // ── Document lifecycle ─────────────────────────────────────────

    /// Give a brand-new document its first block: a level-1 heading with
    /// `title`, or the configured default title.
    ///
    /// A document that already has references is returned unchanged.
    pub async fn initialize_document(
        &self,
        document_id: &str,
        title: Option<&str>,
    ) -> BlockResult<DocumentStructure> {
        let existing = self.structure(document_id).await?;
        if !existing.is_empty() {
            debug!(document_id, refs = existing.block_order.len(), "document already initialized");
            return Ok(existing);
        }

        let title = title.unwrap_or(&self.default_title);
        self.create_block(BlockDraft::new(document_id, 0, HeadingBlock::new(1, title))).await?;
        let structure = self.structures.ensure_structure(document_id).await?;
        info!(document_id, version = structure.version, "initialized document");
        Ok(structure)
    }

    /// Delete a document with every stored block, referenced or orphaned.
    /// Returns the number of blocks removed.
    pub async fn delete_document(&self, document_id: &str) -> BlockResult<usize> {
        let removed = self.repository.delete_document_blocks(document_id).await?;
        self.structures.delete_structure(document_id).await?;
        info!(document_id, removed, "deleted document");
        Ok(removed)
    }

    /// Delete stored blocks of the document that its structure no longer
    /// references. Returns the number removed.
    pub async fn prune_orphans(&self, document_id: &str) -> BlockResult<usize> {
        let structure = self.structure(document_id).await?;
        let orphans: Vec<BlockRef> = self
            .repository
            .document_blocks(document_id)
            .await
            .into_iter()
            .map(|block| block.reference())
            .filter(|reference| !structure.contains(reference))
            .collect();

        for reference in &orphans {
            self.repository.delete_block(reference).await?;
        }
        if !orphans.is_empty() {
            info!(document_id, pruned = orphans.len(), "pruned orphaned blocks");
        }
        Ok(orphans.len())
    }

    pub async fn list_documents(&self) -> BlockResult<Vec<String>> {
        self.structures.document_ids().await
    }

    pub async fn persisted_block_count(&self, document_id: &str) -> BlockResult<usize> {
        self.repository.persisted_block_count(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use folio_common::block::{BlockKind, BlockPayload, TextBlock};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn create_appends_reference_and_renders() {
        let engine = BlockEngine::in_memory();
        engine.create_block(BlockDraft::new("doc-1", 0, HeadingBlock::new(1, "Intro"))).await.unwrap();
        engine.create_block(BlockDraft::new("doc-1", 1, TextBlock::new("Hello"))).await.unwrap();

        let structure = engine.structure("doc-1").await.unwrap();
        assert_eq!(structure.block_order, ["heading:1", "text:1"].map(BlockRef::from).to_vec());
        assert_eq!(structure.version, 3);

        let tree = engine.get_tree("doc-1").await.unwrap().unwrap();
        assert_eq!(tree.children().len(), 2);
    }

    #[tokio::test]
    async fn empty_document_has_no_tree() {
        let engine = BlockEngine::in_memory();
        assert_eq!(engine.get_tree("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_touches_structure() {
        let engine = BlockEngine::in_memory();
        let block = engine.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();
        let before = engine.structure("doc-1").await.unwrap();

        engine.update_block(&block.reference(), &BlockPatch::new().set("text", "b")).await.unwrap();
        let after = engine.structure("doc-1").await.unwrap();

        assert_eq!(after.version, before.version + 1);
        assert!(after.last_modified > before.last_modified);
        assert_eq!(after.block_order, before.block_order);
    }

    #[tokio::test]
    async fn delete_of_unknown_block_is_not_found() {
        let engine = BlockEngine::in_memory();
        let error = engine.delete_block(&BlockRef::from("text:1")).await.unwrap_err();
        assert!(matches!(error, BlockError::NotFound(_)));
    }

    #[tokio::test]
    async fn initialize_uses_default_title_once() {
        let engine = BlockEngine::in_memory().with_default_title("Fresh");
        let structure = engine.initialize_document("doc-1", None).await.unwrap();
        assert_eq!(structure.block_order.len(), 1);

        let again = engine.initialize_document("doc-1", Some("Ignored")).await.unwrap();
        assert_eq!(again, structure);

        let tree = engine.get_tree("doc-1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&tree).unwrap()["content"][0],
            json!({ "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "Fresh" }] })
        );
    }

    #[tokio::test]
    async fn prune_removes_only_unreferenced_blocks() {
        let engine = BlockEngine::in_memory();
        let tree = TreeNode::document(vec![
            TreeNode::new("paragraph").with_content(vec![TreeNode::text("one")]),
        ]);
        engine.import_tree("doc-1", &tree).await.unwrap();
        engine.import_tree("doc-1", &tree).await.unwrap();
        assert_eq!(engine.persisted_block_count("doc-1").await.unwrap(), 2);

        assert_eq!(engine.prune_orphans("doc-1").await.unwrap(), 1);
        assert_eq!(engine.persisted_block_count("doc-1").await.unwrap(), 1);
        assert_eq!(engine.prune_orphans("doc-1").await.unwrap(), 0);

        let blocks = engine.get_ordered_blocks("doc-1").await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), BlockKind::Text);
    }

    #[tokio::test]
    async fn delete_document_cascades_and_unlists() {
        let engine = BlockEngine::in_memory();
        engine.initialize_document("doc-1", Some("One")).await.unwrap();
        engine.initialize_document("doc-2", Some("Two")).await.unwrap();
        assert_eq!(engine.list_documents().await.unwrap(), vec!["doc-1".to_string(), "doc-2".to_string()]);

        assert_eq!(engine.delete_document("doc-1").await.unwrap(), 1);
        assert_eq!(engine.list_documents().await.unwrap(), vec!["doc-2".to_string()]);
        assert_eq!(engine.get_tree("doc-1").await.unwrap(), None);
        assert_eq!(
            engine.get_ordered_blocks("doc-2").await.unwrap()[0].payload,
            BlockPayload::from(HeadingBlock::new(1, "Two"))
        );
    }
}
