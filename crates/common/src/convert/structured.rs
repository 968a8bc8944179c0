// Attribute-only kinds: scholarly references, analytics, pipelines, graphs
// and cross-document links.

use super::{attr_as, attr_opt_string, attr_string, node_types as nt, to_attr_value, TreeCodec};
use crate::block::{
    BibliographyBlock, ChartBlock, CitationBlock, GraphBlock, MetricBlock, PipelineBlock,
    SubDocumentLinkBlock,
};
use crate::tree::TreeNode;

/// Wrap an inline node in the paragraph the editor expects around it.
fn inline_paragraph(inline: TreeNode) -> TreeNode {
    TreeNode::new(nt::PARAGRAPH).with_content(vec![inline])
}

impl TreeCodec for CitationBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            key: attr_string(node, "key"),
            title: attr_opt_string(node, "title"),
            authors: attr_as(node, "authors"),
            year: node.attr_i64("year").and_then(|year| i32::try_from(year).ok()),
            url: attr_opt_string(node, "url"),
        }
    }

    fn to_node(&self) -> TreeNode {
        inline_paragraph(
            TreeNode::new(nt::CITATION)
                .with_attr("key", self.key.as_str())
                .with_attr("title", self.title.clone())
                .with_attr("authors", self.authors.clone())
                .with_attr("year", self.year)
                .with_attr("url", self.url.clone()),
        )
    }
}

impl TreeCodec for BibliographyBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { style: attr_string(node, "style"), entries: attr_as(node, "entries") }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::BIBLIOGRAPHY)
            .with_attr("style", self.style.as_str())
            .with_attr("entries", self.entries.clone())
    }
}

impl TreeCodec for ChartBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            chart_type: attr_string(node, "chartType"),
            data_source: attr_string(node, "dataSource"),
            config: node.attr("config").cloned().unwrap_or_default(),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::CHART)
            .with_attr("chartType", self.chart_type.as_str())
            .with_attr("dataSource", self.data_source.as_str())
            .with_attr("config", self.config.clone())
    }
}

impl TreeCodec for MetricBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            label: attr_string(node, "label"),
            value: node.attr_f64("value").unwrap_or_default(),
            unit: attr_opt_string(node, "unit"),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::METRIC)
            .with_attr("label", self.label.as_str())
            .with_attr("value", self.value)
            .with_attr("unit", self.unit.clone())
    }
}

impl TreeCodec for PipelineBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { name: attr_string(node, "name"), steps: attr_as(node, "steps") }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::PIPELINE)
            .with_attr("name", self.name.as_str())
            .with_attr("steps", to_attr_value(&self.steps))
    }
}

impl TreeCodec for GraphBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { nodes: attr_as(node, "nodes"), edges: attr_as(node, "edges") }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::GRAPH)
            .with_attr("nodes", to_attr_value(&self.nodes))
            .with_attr("edges", to_attr_value(&self.edges))
    }
}

impl TreeCodec for SubDocumentLinkBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            document_id: attr_string(node, "documentId"),
            title: attr_opt_string(node, "title"),
        }
    }

    fn to_node(&self) -> TreeNode {
        inline_paragraph(
            TreeNode::new(nt::SUB_DOCUMENT_LINK)
                .with_attr("documentId", self.document_id.as_str())
                .with_attr("title", self.title.clone()),
        )
    }
}
