// Tables and media references.

use super::{attr_opt_string, attr_string, node_types as nt, paragraph, TreeCodec};
use crate::block::{EmbedBlock, FileAttachmentBlock, ImageBlock, TableBlock, VideoBlock};
use crate::tree::TreeNode;

impl TreeCodec for TableBlock {
    /// A leading row made only of `tableHeader` cells becomes the header row.
    fn from_node(node: &TreeNode) -> Self {
        let mut table = TableBlock::default();
        for (index, row) in node.children().iter().enumerate() {
            let cells = row.children();
            let is_header = index == 0
                && !cells.is_empty()
                && cells.iter().all(|cell| cell.node_type == nt::TABLE_HEADER);
            let texts: Vec<String> = cells.iter().map(TreeNode::plain_text).collect();
            if is_header {
                table.headers = texts;
            } else {
                table.rows.push(texts);
            }
        }
        table
    }

    fn to_node(&self) -> TreeNode {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        if !self.headers.is_empty() {
            rows.push(table_row(nt::TABLE_HEADER, &self.headers));
        }
        rows.extend(self.rows.iter().map(|cells| table_row(nt::TABLE_CELL, cells)));
        TreeNode::new(nt::TABLE).with_content(rows)
    }
}

fn table_row(cell_type: &str, cells: &[String]) -> TreeNode {
    let cells = cells
        .iter()
        .map(|text| TreeNode::new(cell_type).with_content(vec![paragraph(text)]))
        .collect();
    TreeNode::new(nt::TABLE_ROW).with_content(cells)
}

impl TreeCodec for ImageBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            src: attr_string(node, "src"),
            alt: attr_opt_string(node, "alt"),
            caption: attr_opt_string(node, "caption"),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::IMAGE)
            .with_attr("src", self.src.as_str())
            .with_attr("alt", self.alt.clone())
            .with_attr("caption", self.caption.clone())
    }
}

impl TreeCodec for VideoBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { src: attr_string(node, "src"), caption: attr_opt_string(node, "caption") }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::VIDEO)
            .with_attr("src", self.src.as_str())
            .with_attr("caption", self.caption.clone())
    }
}

impl TreeCodec for EmbedBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { url: attr_string(node, "url"), provider: attr_opt_string(node, "provider") }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::EMBED)
            .with_attr("url", self.url.as_str())
            .with_attr("provider", self.provider.clone())
    }
}

impl TreeCodec for FileAttachmentBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            name: attr_string(node, "name"),
            url: attr_string(node, "url"),
            size: node.attr("size").and_then(serde_json::Value::as_u64),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::FILE_ATTACHMENT)
            .with_attr("name", self.name.as_str())
            .with_attr("url", self.url.as_str())
            .with_attr("size", self.size)
    }
}
