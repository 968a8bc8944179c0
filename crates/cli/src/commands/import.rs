// `folio import` — replace a document's blocks with an editor tree.
//
// The tree is read as JSON from a file, or from stdin when the path is `-`.
// Previous blocks stay stored until `folio prune` runs.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use folio_common::tree::TreeNode;
use folio_engine::{BlockEngine, ImportReport};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Document id.
    pub doc: String,

    /// Editor tree JSON file, or `-` for stdin.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

pub async fn run(args: ImportArgs, engine: &BlockEngine, format: OutputFormat) -> anyhow::Result<()> {
    let tree = read_tree(&args.input)?;
    let report = engine
        .import_tree(&args.doc, &tree)
        .await
        .with_context(|| format!("failed to import into `{}`", args.doc))?;
    output::print_output(format, &report, format_human)?;
    Ok(())
}

fn read_tree(input: &Path) -> anyhow::Result<TreeNode> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read tree from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read `{}`", input.display()))?
    };
    parse_tree(&raw)
}

fn parse_tree(raw: &str) -> anyhow::Result<TreeNode> {
    serde_json::from_str(raw).context("input is not an editor tree")
}

fn format_human(report: &ImportReport) -> String {
    format!(
        "Imported {} block(s) into {} (replaced {} reference(s), version {})",
        report.created.len(),
        report.document_id,
        report.previous_refs,
        report.structure_version
    )
}

#[cfg(test)]
mod tests {
    use folio_common::block::BlockRef;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parses_a_document_tree() {
        let tree = parse_tree(
            r#"{"type":"document","content":[{"type":"paragraph","content":[{"type":"text","text":"Hi"}]}]}"#,
        )
        .unwrap();
        assert!(tree.is_document());
        assert_eq!(tree.children().len(), 1);
    }

    #[test]
    fn rejects_non_json_input() {
        let error = parse_tree("# heading").unwrap_err();
        assert!(format!("{error:#}").contains("not an editor tree"));
    }

    #[test]
    fn human_format_summarizes_report() {
        let report = ImportReport {
            document_id: "doc-1".into(),
            created: vec![BlockRef::from("heading:3"), BlockRef::from("text:8")],
            previous_refs: 2,
            structure_version: 5,
        };
        assert_eq!(
            format_human(&report),
            "Imported 2 block(s) into doc-1 (replaced 2 reference(s), version 5)"
        );
    }

    #[tokio::test]
    async fn imports_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(
            &path,
            r#"{"type":"document","content":[{"type":"heading","attrs":{"level":2},"content":[{"type":"text","text":"Plan"}]}]}"#,
        )
        .unwrap();

        let engine = BlockEngine::in_memory();
        run(ImportArgs { doc: "doc-1".into(), input: path }, &engine, OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(engine.structure("doc-1").await.unwrap().block_order.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_has_context() {
        let engine = BlockEngine::in_memory();
        let error = run(
            ImportArgs { doc: "doc-1".into(), input: PathBuf::from("/nonexistent/tree.json") },
            &engine,
            OutputFormat::Json,
        )
        .await
        .unwrap_err();
        assert!(format!("{error:#}").contains("failed to read"));
    }
}
