// `folio blocks` — list a document's resolved blocks.

use clap::Args;
use folio_common::block::Block;
use folio_engine::BlockEngine;
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

const PREVIEW_CHARS: usize = 48;

#[derive(Debug, Args)]
pub struct BlocksArgs {
    /// Document id.
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocksResult {
    pub document_id: String,
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEntry {
    pub reference: String,
    pub kind: String,
    pub order: i64,
    pub version: u64,
    #[serde(default)]
    pub preview: Option<String>,
}

impl From<&Block> for BlockEntry {
    fn from(block: &Block) -> Self {
        Self {
            reference: block.reference().to_string(),
            kind: block.kind().to_string(),
            order: block.order,
            version: block.version,
            preview: block.payload.preview_text().map(preview),
        }
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

pub async fn run(args: BlocksArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let blocks = engine.get_ordered_blocks(&args.doc).await?;
    let result =
        BlocksResult { document_id: args.doc, blocks: blocks.iter().map(BlockEntry::from).collect() };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &BlocksResult) -> String {
    if result.blocks.is_empty() {
        return format!("{} has no blocks.", result.document_id);
    }

    let mut lines = Vec::new();
    lines.push(format!("{} block(s) in {}", result.blocks.len(), result.document_id));
    for b in &result.blocks {
        let preview = b.preview.as_deref().map(|p| format!("  {p}")).unwrap_or_default();
        lines.push(format!("  {:<24} order {:<4} v{}{}", b.reference, b.order, b.version, preview));
    }
    lines.join("\n")
}
