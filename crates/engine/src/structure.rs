// Document structure index: per-document reading order of block references.
//
// Structures are cached after first access. Every mutation bumps the
// version, advances `last_modified` and persists the record; the blocks
// themselves are never written from here.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use folio_common::block::{Block, BlockRef};
use folio_common::document::DocumentStructure;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::BlockResult;
use crate::repository::BlockRepository;
use crate::store::{with_backend, SharedBackend};

pub struct StructureIndex {
    backend: SharedBackend,
    structures: RwLock<HashMap<String, DocumentStructure>>,
}

impl StructureIndex {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend, structures: RwLock::new(HashMap::new()) }
    }

    /// Cached structure, else the stored one, else a new empty structure at
    /// version 1. A new structure is cached but not stored until it changes.
    pub async fn ensure_structure(&self, document_id: &str) -> BlockResult<DocumentStructure> {
        let mut structures = self.structures.write().await;
        let structure = self.ensure_cached(&mut structures, document_id)?;
        Ok(structure.clone())
    }

    fn ensure_cached<'a>(
        &self,
        structures: &'a mut HashMap<String, DocumentStructure>,
        document_id: &str,
    ) -> BlockResult<&'a mut DocumentStructure> {
        match structures.entry(document_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let stored =
                    with_backend(&self.backend, |backend| backend.load_structure(document_id))?;
                let structure = match stored {
                    Some(structure) => {
                        debug!(document_id, version = structure.version, "loaded document structure");
                        structure
                    }
                    None => DocumentStructure::new(document_id),
                };
                Ok(entry.insert(structure))
            }
        }
    }

    /// Apply `change` to a copy of the structure. When it reports a change,
    /// bump, persist, then replace the cached copy.
    async fn mutate(
        &self,
        document_id: &str,
        change: impl FnOnce(&mut DocumentStructure) -> bool,
    ) -> BlockResult<DocumentStructure> {
        let mut structures = self.structures.write().await;
        let cached = self.ensure_cached(&mut structures, document_id)?;

        let mut next = cached.clone();
        if !change(&mut next) {
            return Ok(next);
        }
        next.bump();
        with_backend(&self.backend, |backend| backend.save_structure(&next))?;
        *cached = next.clone();
        Ok(next)
    }

    /// Append a reference. A reference already present is left where it is.
    pub async fn append_ref(
        &self,
        document_id: &str,
        reference: BlockRef,
    ) -> BlockResult<DocumentStructure> {
        self.mutate(document_id, |structure| {
            if structure.contains(&reference) {
                return false;
            }
            structure.block_order.push(reference);
            true
        })
        .await
    }

    pub async fn remove_ref(
        &self,
        document_id: &str,
        reference: &BlockRef,
    ) -> BlockResult<DocumentStructure> {
        self.mutate(document_id, |structure| {
            structure.block_order.retain(|existing| existing != reference);
            true
        })
        .await
    }

    /// Replace the reading order wholesale.
    ///
    /// The new order is not required to be a permutation of the old one;
    /// differing membership is logged and accepted. Duplicates collapse to
    /// their first occurrence.
    pub async fn reorder(
        &self,
        document_id: &str,
        new_order: Vec<BlockRef>,
    ) -> BlockResult<DocumentStructure> {
        self.mutate(document_id, |structure| {
            let previous: HashSet<&BlockRef> = structure.block_order.iter().collect();
            let requested: HashSet<&BlockRef> = new_order.iter().collect();
            if previous != requested {
                let added = requested.difference(&previous).count();
                let dropped = previous.difference(&requested).count();
                warn!(document_id, added, dropped, "reorder changes document membership");
            }
            structure.set_order(new_order);
            true
        })
        .await
    }

    /// Replace the order without the membership check. Used by import and
    /// migration, which rebuild the order from blocks they just resolved.
    pub async fn replace_order(
        &self,
        document_id: &str,
        order: Vec<BlockRef>,
    ) -> BlockResult<DocumentStructure> {
        self.mutate(document_id, |structure| {
            structure.set_order(order);
            true
        })
        .await
    }

    /// Record a content change that leaves the order untouched.
    pub async fn touch(&self, document_id: &str) -> BlockResult<DocumentStructure> {
        self.mutate(document_id, |_| true).await
    }

    /// Resolve the structure's references through the repository.
    ///
    /// Unresolvable references and blocks of other documents are dropped.
    /// The result is sorted by each block's `order` field, not by position
    /// in `block_order`.
    pub async fn get_ordered_blocks(
        &self,
        document_id: &str,
        repository: &BlockRepository,
    ) -> BlockResult<Vec<Block>> {
        let structure = self.ensure_structure(document_id).await?;
        let mut blocks = Vec::with_capacity(structure.block_order.len());
        for reference in &structure.block_order {
            match repository.get_block(reference).await {
                Some(block) if block.document_id == document_id => blocks.push(block),
                Some(block) => {
                    debug!(document_id, block = %reference, owner = %block.document_id, "skipping foreign block");
                }
                None => {
                    debug!(document_id, block = %reference, "skipping unresolved reference");
                }
            }
        }
        blocks.sort_by_key(|block| block.order);
        Ok(blocks)
    }

    /// Drop a structure from the cache and the store.
    pub async fn delete_structure(&self, document_id: &str) -> BlockResult<bool> {
        let mut structures = self.structures.write().await;
        let deleted = with_backend(&self.backend, |backend| backend.delete_structure(document_id))?;
        let cached = structures.remove(document_id).is_some();
        Ok(deleted || cached)
    }

    /// Stored documents plus any cached structure that has references.
    pub async fn document_ids(&self) -> BlockResult<Vec<String>> {
        let stored = with_backend(&self.backend, |backend| backend.list_documents())?;
        let structures = self.structures.read().await;
        let ids: BTreeSet<String> = stored
            .into_iter()
            .chain(
                structures
                    .values()
                    .filter(|structure| !structure.is_empty())
                    .map(|structure| structure.document_id.clone()),
            )
            .collect();
        Ok(ids.into_iter().collect())
    }
}
