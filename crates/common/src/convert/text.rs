// Text-like kinds: headings, paragraphs, quotes, lists and their relatives.

use super::{attr_string, node_types as nt, paragraph, text_leaf, TreeCodec};
use crate::block::{
    CalloutBlock, DividerBlock, FootnoteBlock, HeadingBlock, ListBlock, QuoteBlock, TaskItem,
    TaskListBlock, TextBlock, ToggleBlock,
};
use crate::tree::TreeNode;

impl TreeCodec for HeadingBlock {
    fn from_node(node: &TreeNode) -> Self {
        let level = node.attr_i64("level").and_then(|level| u8::try_from(level).ok()).unwrap_or(1);
        Self { level, text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::HEADING)
            .with_attr("level", self.level)
            .with_content(vec![text_leaf(&self.text)])
    }
}

impl TreeCodec for TextBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        paragraph(&self.text)
    }
}

impl TreeCodec for QuoteBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::BLOCKQUOTE).with_content(vec![paragraph(&self.text)])
    }
}

impl TreeCodec for CalloutBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { variant: attr_string(node, "variant"), text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::CALLOUT)
            .with_attr("variant", self.variant.as_str())
            .with_content(vec![paragraph(&self.text)])
    }
}

impl TreeCodec for ToggleBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { summary: attr_string(node, "summary"), text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::TOGGLE)
            .with_attr("summary", self.summary.as_str())
            .with_content(vec![paragraph(&self.text)])
    }
}

impl TreeCodec for FootnoteBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { label: attr_string(node, "label"), text: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::FOOTNOTE)
            .with_attr("label", self.label.as_str())
            .with_content(vec![paragraph(&self.text)])
    }
}

impl TreeCodec for ListBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            ordered: node.node_type == nt::ORDERED_LIST,
            items: node.children().iter().map(TreeNode::plain_text).collect(),
        }
    }

    fn to_node(&self) -> TreeNode {
        let node_type = if self.ordered { nt::ORDERED_LIST } else { nt::BULLET_LIST };
        let items = self
            .items
            .iter()
            .map(|item| TreeNode::new(nt::LIST_ITEM).with_content(vec![paragraph(item)]))
            .collect();
        TreeNode::new(node_type).with_content(items)
    }
}

impl TreeCodec for TaskListBlock {
    fn from_node(node: &TreeNode) -> Self {
        let items = node
            .children()
            .iter()
            .map(|item| TaskItem {
                text: item.plain_text(),
                checked: item.attr_bool("checked").unwrap_or(false),
            })
            .collect();
        Self { items }
    }

    fn to_node(&self) -> TreeNode {
        let items = self
            .items
            .iter()
            .map(|item| {
                TreeNode::new(nt::TASK_ITEM)
                    .with_attr("checked", item.checked)
                    .with_content(vec![paragraph(&item.text)])
            })
            .collect();
        TreeNode::new(nt::TASK_LIST).with_content(items)
    }
}

impl TreeCodec for DividerBlock {
    fn from_node(_node: &TreeNode) -> Self {
        Self {}
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::HORIZONTAL_RULE)
    }
}
