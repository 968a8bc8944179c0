// `folio ls` — list stored documents.

use clap::Args;
use folio_engine::BlockEngine;
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct LsArgs {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsResult {
    #[serde(default)]
    pub documents: Vec<DocEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEntry {
    pub document_id: String,
    /// References in the document's order.
    pub blocks: usize,
    /// Stored blocks, including unreferenced ones.
    pub stored: usize,
    pub version: u64,
}

impl DocEntry {
    fn orphans(&self) -> usize {
        self.stored.saturating_sub(self.blocks)
    }
}

pub async fn run(_args: LsArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let result = list(engine).await?;
    output::print_output(format, &result, format_human)?;
    Ok(())
}

async fn list(engine: &BlockEngine) -> anyhow::Result<LsResult> {
    let mut documents = Vec::new();
    for document_id in engine.list_documents().await? {
        let structure = engine.structure(&document_id).await?;
        let stored = engine.persisted_block_count(&document_id).await?;
        documents.push(DocEntry {
            blocks: structure.block_order.len(),
            stored,
            version: structure.version,
            document_id,
        });
    }
    Ok(LsResult { documents })
}

fn format_human(result: &LsResult) -> String {
    if result.documents.is_empty() {
        return "No documents.".into();
    }

    let mut lines = Vec::new();
    lines.push(format!("{} document(s)", result.documents.len()));
    for d in &result.documents {
        let orphans = if d.orphans() > 0 {
            format!(" ({} unreferenced)", d.orphans())
        } else {
            String::new()
        };
        lines.push(format!("  {}: {} block(s), version {}{}", d.document_id, d.blocks, d.version, orphans));
    }
    lines.join("\n")
}
