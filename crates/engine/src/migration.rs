// Upgrade of structures written before composite block references.
//
// Legacy structures list bare numeric ids, which are ambiguous once each
// kind has its own id partition. The order is rebuilt from the document's
// loaded blocks sorted by their `order` field.

use folio_common::block::{Block, BlockRef};
use folio_common::document::DocumentStructure;
use tracing::info;

use crate::error::BlockResult;
use crate::repository::BlockRepository;
use crate::structure::StructureIndex;

pub fn needs_migration(structure: &DocumentStructure) -> bool {
    structure.block_order.iter().any(|reference| !reference.is_composite())
}

/// References of `blocks` sorted by `order` (stable).
pub fn order_from_blocks(blocks: &[Block]) -> Vec<BlockRef> {
    let mut sorted: Vec<&Block> = blocks.iter().collect();
    sorted.sort_by_key(|block| block.order);
    sorted.into_iter().map(Block::reference).collect()
}

/// Rebuild the document's order from its cached blocks if any stored
/// reference is not composite. Returns whether the structure changed.
///
/// Every legacy id is assumed to have a loaded block; no attempt is made to
/// map individual legacy ids.
pub async fn migrate_if_needed(
    document_id: &str,
    repository: &BlockRepository,
    structures: &StructureIndex,
) -> BlockResult<bool> {
    let structure = structures.ensure_structure(document_id).await?;
    if !needs_migration(&structure) {
        return Ok(false);
    }

    let legacy = structure.block_order.iter().filter(|reference| !reference.is_composite()).count();
    let blocks = repository.document_blocks(document_id).await;
    let migrated = structures.replace_order(document_id, order_from_blocks(&blocks)).await?;

    info!(
        document_id,
        legacy_refs = legacy,
        blocks = migrated.block_order.len(),
        version = migrated.version,
        "migrated document structure to composite references"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use folio_common::block::{BlockDraft, TextBlock};

    use super::*;
    use crate::store::{shared, with_backend, MemoryBackend};

    #[test]
    fn structure_with_any_bare_id_needs_migration() {
        let mut structure = DocumentStructure::new("doc-1");
        structure.set_order(["text:1", "2"].map(BlockRef::from));
        assert!(needs_migration(&structure));

        structure.set_order(["text:1", "heading:2"].map(BlockRef::from));
        assert!(!needs_migration(&structure));
        assert!(!needs_migration(&DocumentStructure::new("empty")));
    }

    #[tokio::test]
    async fn legacy_order_is_rebuilt_from_block_order_fields() {
        let backend = shared(MemoryBackend::new());
        let repository = BlockRepository::new(backend.clone());
        let structures = StructureIndex::new(backend.clone());

        for (text, order) in [("first", 1), ("second", 2), ("third", 0)] {
            repository.create_block(BlockDraft::new("doc-1", order, TextBlock::new(text))).await.unwrap();
        }
        let mut legacy = DocumentStructure::new("doc-1");
        legacy.set_order(["3", "1", "2"].map(BlockRef::from));
        with_backend(&backend, |b| b.save_structure(&legacy)).unwrap();

        assert!(migrate_if_needed("doc-1", &repository, &structures).await.unwrap());
        let migrated = structures.ensure_structure("doc-1").await.unwrap();
        assert_eq!(migrated.block_order, ["text:3", "text:1", "text:2"].map(BlockRef::from).to_vec());
        assert_eq!(migrated.version, legacy.version + 1);

        assert!(!migrate_if_needed("doc-1", &repository, &structures).await.unwrap());
        assert_eq!(structures.ensure_structure("doc-1").await.unwrap(), migrated);
    }
}
