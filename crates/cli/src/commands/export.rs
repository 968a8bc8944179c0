// `folio export` — print a document as an editor tree.

use clap::Args;
use folio_common::tree::TreeNode;
use folio_engine::BlockEngine;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Document id.
    pub doc: String,
}

pub async fn run(args: ExportArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    // A document with no resolvable blocks exports as an empty tree.
    let tree = engine.get_tree(&args.doc).await?.unwrap_or_else(|| TreeNode::document(vec![]));
    output::print_output(format, &tree, format_human)?;
    Ok(())
}

fn format_human(tree: &TreeNode) -> String {
    serde_json::to_string_pretty(tree).unwrap_or_else(|_| tree.plain_text())
}
