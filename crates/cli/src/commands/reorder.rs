// `folio reorder` — rewrite a document's reference order.
//
// Only the structure changes; block `order` fields are left as they are.

use clap::Args;
use folio_common::block::BlockRef;
use folio_common::document::DocumentStructure;
use folio_engine::BlockEngine;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Document id.
    pub doc: String,

    /// References in their new order (e.g. `heading:1 text:4`).
    #[arg(required = true, num_args = 1..)]
    pub refs: Vec<String>,
}

pub async fn run(args: ReorderArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let order = args.refs.into_iter().map(BlockRef::from).collect();
    let structure = engine.reorder(&args.doc, order).await?;
    output::print_output(format, &structure, format_human)?;
    Ok(())
}

fn format_human(structure: &DocumentStructure) -> String {
    let refs: Vec<String> = structure.block_order.iter().map(ToString::to_string).collect();
    format!("{} (version {}): {}", structure.document_id, structure.version, refs.join(" "))
}

#[cfg(test)]
mod tests {
    use folio_common::block::{BlockDraft, TextBlock};

    use super::*;

    #[tokio::test]
    async fn reorder_rewrites_references() {
        let engine = BlockEngine::in_memory();
        let a = engine.create_block(BlockDraft::new("doc-1", 0, TextBlock::new("a"))).await.unwrap();
        let b = engine.create_block(BlockDraft::new("doc-1", 1, TextBlock::new("b"))).await.unwrap();

        let args = ReorderArgs {
            doc: "doc-1".into(),
            refs: vec![b.reference().to_string(), a.reference().to_string()],
        };
        run(args, &engine, OutputFormat::Json).await.unwrap();

        let structure = engine.structure("doc-1").await.unwrap();
        assert_eq!(structure.block_order, vec![b.reference(), a.reference()]);
        assert_eq!(format_human(&structure), format!("doc-1 (version {}): text:2 text:1", structure.version));
    }
}
