// Import of an editor tree into a document's block set.
//
// Every import creates fresh blocks; nothing is reused or updated. The
// previous blocks stay stored but unreferenced until `prune_orphans` runs.
// A failure partway through leaves the structure pointing at the old
// blocks and the new ones orphaned.

use folio_common::block::{BlockDraft, BlockRef, ValidationError};
use folio_common::convert::block_from_node;
use folio_common::tree::TreeNode;
use serde::Serialize;
use tracing::info;

use crate::error::BlockResult;
use crate::repository::BlockRepository;
use crate::structure::StructureIndex;

/// Outcome of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub document_id: String,
    /// New references, in tree order.
    pub created: Vec<BlockRef>,
    /// Length of the order the import replaced.
    pub previous_refs: usize,
    pub structure_version: u64,
}

pub async fn import_tree(
    document_id: &str,
    tree: &TreeNode,
    repository: &BlockRepository,
    structures: &StructureIndex,
) -> BlockResult<ImportReport> {
    if !tree.is_document() {
        return Err(ValidationError::UnexpectedRoot(tree.node_type.clone()).into());
    }

    let mut created = Vec::with_capacity(tree.children().len());
    for (position, node) in tree.children().iter().enumerate() {
        let draft = BlockDraft::new(document_id, position as i64, block_from_node(node));
        let block = repository.create_block(draft).await?;
        created.push(block.reference());
    }

    let previous_refs = structures.ensure_structure(document_id).await?.block_order.len();
    let structure = structures.replace_order(document_id, created.clone()).await?;

    info!(
        document_id,
        created = created.len(),
        previous_refs,
        version = structure.version,
        "imported document tree"
    );
    Ok(ImportReport {
        document_id: document_id.to_string(),
        created,
        previous_refs,
        structure_version: structure.version,
    })
}

#[cfg(test)]
mod tests {
    use folio_common::block::{BlockKind, BlockPayload, TextBlock};

    use super::*;
    use crate::error::BlockError;
    use crate::store::{shared, MemoryBackend};

    fn services() -> (BlockRepository, StructureIndex) {
        let backend = shared(MemoryBackend::new());
        (BlockRepository::new(backend.clone()), StructureIndex::new(backend))
    }

    #[tokio::test]
    async fn non_document_root_is_rejected() {
        let (repository, structures) = services();
        let error = import_tree("doc-1", &TreeNode::new("paragraph"), &repository, &structures)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            BlockError::Validation(ValidationError::UnexpectedRoot(ref root)) if root == "paragraph"
        ));
    }

    #[tokio::test]
    async fn nodes_become_blocks_ordered_by_position() {
        let (repository, structures) = services();
        let tree = TreeNode::document(vec![
            TreeNode::new("heading").with_attr("level", 2).with_content(vec![TreeNode::text("Title")]),
            TreeNode::new("mysteryWidget"),
            TreeNode::new("paragraph").with_content(vec![TreeNode::text("Body")]),
        ]);

        let report = import_tree("doc-1", &tree, &repository, &structures).await.unwrap();
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.previous_refs, 0);

        let blocks = structures.get_ordered_blocks("doc-1", &repository).await.unwrap();
        let orders: Vec<i64> = blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(blocks[0].kind(), BlockKind::Heading);
        assert_eq!(blocks[1].payload, BlockPayload::from(TextBlock::new("[Unsupported block: mysteryWidget]")));
    }

    #[tokio::test]
    async fn empty_document_clears_the_order() {
        let (repository, structures) = services();
        let tree = TreeNode::document(vec![TreeNode::new("horizontalRule")]);
        import_tree("doc-1", &tree, &repository, &structures).await.unwrap();

        let report = import_tree("doc-1", &TreeNode::document(vec![]), &repository, &structures)
            .await
            .unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.previous_refs, 1);
        assert!(structures.ensure_structure("doc-1").await.unwrap().is_empty());
    }
}
