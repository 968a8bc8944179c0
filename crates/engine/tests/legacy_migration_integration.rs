use folio_common::block::{BlockDraft, BlockRef, HeadingBlock, TextBlock};
use folio_common::document::{timestamp_now, DocumentStructure};
use folio_engine::store::{BlockBackend, MemoryBackend, SqliteBackend};
use folio_engine::BlockEngine;
use tempfile::TempDir;

const DOC: &str = "legacy-doc";

/// Three text blocks whose `order` fields disagree with their ids, plus a
/// structure that still lists bare ids.
fn seed_legacy(backend: &mut dyn BlockBackend) -> DocumentStructure {
    let now = timestamp_now();
    for (text, order) in [("first", 1), ("second", 2), ("third", 0)] {
        backend.insert_block(&BlockDraft::new(DOC, order, TextBlock::new(text)), now).unwrap();
    }
    let mut legacy = DocumentStructure::new(DOC);
    legacy.set_order(["3", "1", "2"].map(BlockRef::from));
    backend.save_structure(&legacy).unwrap();
    legacy
}

fn composite(refs: &[&str]) -> Vec<BlockRef> {
    refs.iter().map(|r| BlockRef::from(*r)).collect()
}

#[tokio::test]
async fn loading_a_legacy_document_rewrites_its_order() {
    let mut backend = MemoryBackend::new();
    let legacy = seed_legacy(&mut backend);
    let engine = BlockEngine::new(backend);

    let structure = engine.structure(DOC).await.unwrap();
    assert_eq!(structure.block_order, composite(&["text:3", "text:1", "text:2"]));
    assert_eq!(structure.version, legacy.version + 1);
    assert!(structure.last_modified > legacy.last_modified);

    let tree = engine.get_tree(DOC).await.unwrap().unwrap();
    let texts: Vec<String> = tree.children().iter().map(|node| node.plain_text()).collect();
    assert_eq!(texts, vec!["third", "first", "second"]);
}

#[tokio::test]
async fn migration_runs_once() {
    let mut backend = MemoryBackend::new();
    seed_legacy(&mut backend);
    let engine = BlockEngine::new(backend);

    let migrated = engine.structure(DOC).await.unwrap();
    engine.load_document_blocks(DOC).await.unwrap();
    assert_eq!(engine.structure(DOC).await.unwrap(), migrated);
}

#[tokio::test]
async fn mixed_legacy_and_composite_refs_are_rebuilt_from_blocks() {
    let mut backend = MemoryBackend::new();
    let now = timestamp_now();
    backend.insert_block(&BlockDraft::new(DOC, 0, HeadingBlock::new(1, "Title")), now).unwrap();
    backend.insert_block(&BlockDraft::new(DOC, 1, TextBlock::new("Body")), now).unwrap();
    let mut legacy = DocumentStructure::new(DOC);
    legacy.set_order(["heading:1", "1"].map(BlockRef::from));
    backend.save_structure(&legacy).unwrap();

    let engine = BlockEngine::new(backend);
    let structure = engine.structure(DOC).await.unwrap();
    assert_eq!(structure.block_order, composite(&["heading:1", "text:1"]));
}

#[tokio::test]
async fn migrated_order_is_persisted_to_sqlite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocks.db");
    {
        let mut backend = SqliteBackend::open(&path).unwrap();
        seed_legacy(&mut backend);
    }

    {
        let engine = BlockEngine::open(&path).unwrap();
        let structure = engine.structure(DOC).await.unwrap();
        assert_eq!(structure.block_order, composite(&["text:3", "text:1", "text:2"]));
    }

    let backend = SqliteBackend::open(&path).unwrap();
    let stored = backend.load_structure(DOC).unwrap().expect("structure should be stored");
    assert_eq!(stored.block_order, composite(&["text:3", "text:1", "text:2"]));
    assert_eq!(stored.version, 2);
}
