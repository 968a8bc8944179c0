// Durable block backend over the SQLite block database.
//
// Each kind is a partition of the `blocks` table keyed by `(kind, local_id)`.
// `block_sequences` holds the last id handed out per kind, so ids are never
// reused after a delete. Payloads are stored as tagged JSON text.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use folio_common::block::{Block, BlockDraft, BlockKind, BlockPayload, BlockRef};
use folio_common::document::DocumentStructure;
use rusqlite::{params, OptionalExtension};

use super::backend::BlockBackend;
use super::meta_db::MetaDb;
use crate::error::StoreError;

const BLOCK_COLUMNS: &str =
    "kind, local_id, document_id, position, version, created_at, updated_at, payload";

#[derive(Debug)]
pub struct SqliteBackend {
    db: MetaDb,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { db: MetaDb::open(path)? })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { db: MetaDb::open_in_memory()? })
    }

    pub fn meta_db(&self) -> &MetaDb {
        &self.db
    }
}

/// Raw `blocks` row before decoding.
struct BlockRow {
    kind: String,
    local_id: i64,
    document_id: String,
    position: i64,
    version: i64,
    created_at: i64,
    updated_at: i64,
    payload: String,
}

fn row_to_block_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockRow> {
    Ok(BlockRow {
        kind: row.get(0)?,
        local_id: row.get(1)?,
        document_id: row.get(2)?,
        position: row.get(3)?,
        version: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        payload: row.get(7)?,
    })
}

impl BlockRow {
    fn into_block(self) -> Result<Block, StoreError> {
        let payload: BlockPayload = serde_json::from_str(&self.payload)?;
        if payload.kind().as_str() != self.kind {
            return Err(corrupt(
                "blocks",
                format!(
                    "row {}:{} holds a `{}` payload",
                    self.kind,
                    self.local_id,
                    payload.kind()
                ),
            ));
        }
        Ok(Block {
            id: self.local_id,
            document_id: self.document_id,
            order: self.position,
            version: decode_version("blocks", self.version)?,
            created_at: decode_micros("blocks", self.created_at)?,
            updated_at: decode_micros("blocks", self.updated_at)?,
            payload,
        })
    }
}

fn corrupt(table: &'static str, reason: String) -> StoreError {
    StoreError::Corrupt { table, reason }
}

fn decode_micros(table: &'static str, micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| corrupt(table, format!("timestamp {micros} is out of range")))
}

fn decode_version(table: &'static str, version: i64) -> Result<u64, StoreError> {
    u64::try_from(version).map_err(|_| corrupt(table, format!("negative version {version}")))
}

fn encode_version(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version)
        .map_err(|_| StoreError::Unavailable(format!("version {version} exceeds sqlite range")))
}

impl BlockBackend for SqliteBackend {
    fn insert_block(&mut self, draft: &BlockDraft, now: DateTime<Utc>) -> Result<Block, StoreError> {
        let kind = draft.kind();
        let payload = serde_json::to_string(&draft.payload)?;
        let micros = now.timestamp_micros();

        let tx = self.db.connection_mut().transaction()?;
        tx.execute(
            "INSERT INTO block_sequences (kind, last_id) VALUES (?1, 1) \
             ON CONFLICT(kind) DO UPDATE SET last_id = last_id + 1",
            params![kind.as_str()],
        )?;
        let id: i64 = tx.query_row(
            "SELECT last_id FROM block_sequences WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        tx.execute(
            &format!("INSERT INTO blocks ({BLOCK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5, ?6)"),
            params![kind.as_str(), id, draft.document_id, draft.order, micros, payload],
        )?;
        tx.commit()?;

        Ok(Block {
            id,
            document_id: draft.document_id.clone(),
            order: draft.order,
            version: 1,
            created_at: now,
            updated_at: now,
            payload: draft.payload.clone(),
        })
    }

    fn update_block(&mut self, block: &Block) -> Result<bool, StoreError> {
        let payload = serde_json::to_string(&block.payload)?;
        let changed = self.db.connection().execute(
            "UPDATE blocks \
             SET document_id = ?1, position = ?2, version = ?3, updated_at = ?4, payload = ?5 \
             WHERE kind = ?6 AND local_id = ?7",
            params![
                block.document_id,
                block.order,
                encode_version(block.version)?,
                block.updated_at.timestamp_micros(),
                payload,
                block.kind().as_str(),
                block.id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_block(&mut self, kind: BlockKind, id: i64) -> Result<bool, StoreError> {
        let changed = self.db.connection().execute(
            "DELETE FROM blocks WHERE kind = ?1 AND local_id = ?2",
            params![kind.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    fn load_document_blocks(&self, document_id: &str) -> Result<Vec<Block>, StoreError> {
        let mut stmt = self.db.connection().prepare(&format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks \
             WHERE document_id = ?1 \
             ORDER BY position ASC, kind ASC, local_id ASC"
        ))?;
        let rows = stmt
            .query_map(params![document_id], row_to_block_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut blocks: Vec<Block> =
            rows.into_iter().map(BlockRow::into_block).collect::<Result<_, _>>()?;
        // SQL orders kinds by tag text; match the enum order the memory backend uses.
        blocks.sort_by(|a, b| (a.order, a.kind(), a.id).cmp(&(b.order, b.kind(), b.id)));
        Ok(blocks)
    }

    fn delete_document_blocks(&mut self, document_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .db
            .connection()
            .execute("DELETE FROM blocks WHERE document_id = ?1", params![document_id])?)
    }

    fn count_document_blocks(&self, document_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM blocks WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| corrupt("blocks", format!("negative count {count}")))
    }

    fn load_structure(&self, document_id: &str) -> Result<Option<DocumentStructure>, StoreError> {
        let row: Option<(String, i64, i64)> = self
            .db
            .connection()
            .query_row(
                "SELECT block_order, version, last_modified \
                 FROM document_structures WHERE document_id = ?1",
                params![document_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((block_order, version, last_modified)) = row else {
            return Ok(None);
        };
        let block_order: Vec<BlockRef> = serde_json::from_str(&block_order)?;
        Ok(Some(DocumentStructure {
            document_id: document_id.to_string(),
            block_order,
            version: decode_version("document_structures", version)?,
            last_modified: decode_micros("document_structures", last_modified)?,
        }))
    }

    fn save_structure(&mut self, structure: &DocumentStructure) -> Result<(), StoreError> {
        let block_order = serde_json::to_string(&structure.block_order)?;
        self.db.connection().execute(
            "INSERT INTO document_structures (document_id, block_order, version, last_modified) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(document_id) DO UPDATE SET \
                 block_order = excluded.block_order, \
                 version = excluded.version, \
                 last_modified = excluded.last_modified",
            params![
                structure.document_id,
                block_order,
                encode_version(structure.version)?,
                structure.last_modified.timestamp_micros(),
            ],
        )?;
        Ok(())
    }

    fn delete_structure(&mut self, document_id: &str) -> Result<bool, StoreError> {
        let changed = self.db.connection().execute(
            "DELETE FROM document_structures WHERE document_id = ?1",
            params![document_id],
        )?;
        Ok(changed > 0)
    }

    fn list_documents(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.connection().prepare(
            "SELECT document_id FROM document_structures \
             UNION \
             SELECT document_id FROM blocks \
             ORDER BY 1",
        )?;
        let ids = stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}
