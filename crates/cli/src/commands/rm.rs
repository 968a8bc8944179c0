// `folio rm` — delete a document with every stored block.

use clap::Args;
use folio_engine::BlockEngine;
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Document id.
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmResult {
    pub document_id: String,
    pub deleted_blocks: usize,
}

pub async fn run(args: RmArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let deleted_blocks = engine.delete_document(&args.doc).await?;
    let result = RmResult { document_id: args.doc, deleted_blocks };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &RmResult) -> String {
    format!("Deleted {} ({} block(s))", result.document_id, result.deleted_blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rm_removes_document() {
        let engine = BlockEngine::in_memory();
        engine.initialize_document("doc-1", None).await.unwrap();

        run(RmArgs { doc: "doc-1".into() }, &engine, OutputFormat::Json).await.unwrap();
        assert!(engine.list_documents().await.unwrap().is_empty());
    }

    #[test]
    fn human_format() {
        let result = RmResult { document_id: "doc-1".into(), deleted_blocks: 4 };
        assert_eq!(format_human(&result), "Deleted doc-1 (4 block(s))");
    }
}
