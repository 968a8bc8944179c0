// folio-engine: block repository, document structures and the engine facade.

pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod migration;
pub mod repository;
pub mod store;
pub mod structure;

pub use engine::BlockEngine;
pub use error::{BlockError, BlockResult, StoreError};
pub use import::ImportReport;
