// SQLite database file holding blocks, kind sequences and document structures.
//
// Table schema is versioned through `schema_migrations`; each pending
// migration is applied in its own transaction on open.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE blocks (
    kind            TEXT NOT NULL,
    local_id        INTEGER NOT NULL,
    document_id     TEXT NOT NULL,
    position        INTEGER NOT NULL,
    version         INTEGER NOT NULL,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    payload         TEXT NOT NULL,
    PRIMARY KEY (kind, local_id)
);

CREATE TABLE block_sequences (
    kind            TEXT PRIMARY KEY,
    last_id         INTEGER NOT NULL
);

CREATE TABLE document_structures (
    document_id     TEXT PRIMARY KEY,
    block_order     TEXT NOT NULL,
    version         INTEGER NOT NULL,
    last_modified   INTEGER NOT NULL
);

CREATE INDEX blocks_document_idx
    ON blocks (document_id, position);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

#[derive(Debug)]
pub struct MetaDb {
    conn: Connection,
}

impl MetaDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create block database directory `{}`", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open block database at `{}`", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("failed to configure sqlite pragmas for block database")?;

        Self::prepare(conn)
    }

    /// A private database that disappears when dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory block database")?;
        Self::prepare(conn)
    }

    fn prepare(mut conn: Connection) -> Result<Self> {
        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .context("failed to ensure schema_migrations table exists")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .context("failed to read current schema version")
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply block database migration v{version}"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .with_context(|| format!("failed to record migration v{version}"))?;
        tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
        current_version = *version;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::params;
    use tempfile::TempDir;

    use super::MetaDb;

    const EXPECTED_TABLES: &[&str] =
        &["schema_migrations", "blocks", "block_sequences", "document_structures"];

    fn table_exists(db: &MetaDb, kind: &str, name: &str) -> bool {
        let count: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(1) FROM sqlite_master WHERE type = ?1 AND name = ?2",
                [kind, name],
                |row| row.get(0),
            )
            .expect("sqlite_master query should succeed");
        count == 1
    }

    #[test]
    fn open_creates_schema_and_records_latest_migration() {
        let dir = TempDir::new().unwrap();
        let db = MetaDb::open(dir.path().join("blocks.db")).expect("block db should open");

        for table in EXPECTED_TABLES {
            assert!(table_exists(&db, "table", table), "expected `{table}` table to exist");
        }
        assert!(table_exists(&db, "index", "blocks_document_idx"));
        assert_eq!(db.schema_version().expect("schema version should be readable"), 1);
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("blocks.db");
        MetaDb::open(&path).expect("block db should open");
        assert!(path.exists());
    }

    #[test]
    fn reopening_keeps_rows_and_skips_applied_migrations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocks.db");
        {
            let first = MetaDb::open(&path).expect("first open should succeed");
            assert_eq!(first.schema_version().unwrap(), 1);
            first
                .connection()
                .execute(
                    "INSERT INTO block_sequences (kind, last_id) VALUES (?1, ?2)",
                    params!["text", 4],
                )
                .unwrap();
        }

        let second = MetaDb::open(&path).expect("second open should succeed");
        let migration_rows: i64 = second
            .connection()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("schema migration count query should succeed");
        assert_eq!(migration_rows, 1);
        let last_id: i64 = second
            .connection()
            .query_row("SELECT last_id FROM block_sequences WHERE kind = 'text'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(last_id, 4);
    }

    #[test]
    fn in_memory_database_is_fully_migrated() {
        let db = MetaDb::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
        assert!(table_exists(&db, "index", "blocks_document_idx"));
    }
}
