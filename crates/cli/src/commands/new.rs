// `folio new` — create a document whose first block is its title heading.

use clap::Args;
use folio_engine::BlockEngine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Heading text for the first block (defaults to the configured title).
    #[arg(long)]
    title: Option<String>,

    /// Document id to use instead of a generated UUID.
    #[arg(long)]
    id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
    pub document_id: String,
    pub blocks: Vec<String>,
    pub version: u64,
}

pub async fn run(args: NewArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let document_id = args.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let structure = engine.initialize_document(&document_id, args.title.as_deref()).await?;

    let result = NewResult {
        document_id,
        blocks: structure.block_order.iter().map(ToString::to_string).collect(),
        version: structure.version,
    };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &NewResult) -> String {
    format!(
        "Created {} ({} block(s), version {})",
        result.document_id,
        result.blocks.len(),
        result.version
    )
}
