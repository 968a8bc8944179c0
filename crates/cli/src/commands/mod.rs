// CLI subcommand dispatch.

use clap::Subcommand;
use folio_engine::config::FolioConfig;
use folio_engine::BlockEngine;
use tracing::debug;

use crate::output::OutputFormat;

pub mod blocks;
pub mod export;
pub mod import;
pub mod ls;
pub mod new;
pub mod prune;
pub mod reorder;
pub mod rm;

#[derive(Subcommand)]
pub enum Command {
    /// Create a document with its title heading
    New(new::NewArgs),
    /// Replace a document's blocks with an editor tree (JSON)
    Import(import::ImportArgs),
    /// Print a document as an editor tree (JSON)
    Export(export::ExportArgs),
    /// List a document's blocks in reading order
    Blocks(blocks::BlocksArgs),
    /// List stored documents
    Ls(ls::LsArgs),
    /// Rewrite a document's reference order
    Reorder(reorder::ReorderArgs),
    /// Delete blocks no longer referenced by their document
    Prune(prune::PruneArgs),
    /// Delete a document and all of its blocks
    Rm(rm::RmArgs),
}

pub async fn run(cmd: Command, config: &FolioConfig, format: OutputFormat) -> anyhow::Result<()> {
    debug!(db = %config.database_path.display(), "opening block store");
    let engine = BlockEngine::from_config(config)?;

    match cmd {
        Command::New(args) => new::run(args, &engine, format).await,
        Command::Import(args) => import::run(args, &engine, format).await,
        Command::Export(args) => export::run(args, &engine, format).await,
        Command::Blocks(args) => blocks::run(args, &engine, format).await,
        Command::Ls(args) => ls::run(args, &engine, format).await,
        Command::Reorder(args) => reorder::run(args, &engine, format).await,
        Command::Prune(args) => prune::run(args, &engine, format).await,
        Command::Rm(args) => rm::run(args, &engine, format).await,
    }
}
