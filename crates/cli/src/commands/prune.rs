// `folio prune` — delete blocks the document no longer references.

use clap::Args;
use folio_engine::BlockEngine;
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Document id.
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneResult {
    pub document_id: String,
    pub pruned: usize,
}

pub async fn run(args: PruneArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let pruned = engine.prune_orphans(&args.doc).await?;
    let result = PruneResult { document_id: args.doc, pruned };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &PruneResult) -> String {
    match result.pruned {
        0 => format!("{}: nothing to prune.", result.document_id),
        n => format!("{}: pruned {n} unreferenced block(s).", result.document_id),
    }
}
