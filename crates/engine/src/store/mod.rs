// Persistence: backend trait, in-memory backend, SQLite block database.

pub mod backend;
pub mod meta_db;
pub mod sqlite;

pub use backend::{shared, with_backend, BlockBackend, MemoryBackend, SharedBackend};
pub use sqlite::SqliteBackend;
