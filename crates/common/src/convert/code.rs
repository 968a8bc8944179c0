// Code, math, diagrams and queries: kinds whose body is source text.

use super::{attr_as, attr_opt_string, attr_string, node_types as nt, text_leaf, to_attr_value, TreeCodec};
use crate::block::{CodeBlock, DiagramBlock, ExecutableCodeBlock, MathBlock, QueryBlock};
use crate::tree::TreeNode;

impl TreeCodec for CodeBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { language: attr_opt_string(node, "language"), code: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::CODE_BLOCK)
            .with_attr("language", self.language.clone())
            .with_content(vec![text_leaf(&self.code)])
    }
}

impl TreeCodec for ExecutableCodeBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            language: attr_string(node, "language"),
            code: node.plain_text(),
            output: attr_opt_string(node, "output"),
            session_id: attr_opt_string(node, "sessionId"),
            execution_count: node.attr_i64("executionCount").and_then(|n| u32::try_from(n).ok()),
            status: attr_as(node, "status"),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::EXECUTABLE_CODE)
            .with_attr("language", self.language.as_str())
            .with_attr("sessionId", self.session_id.clone())
            .with_attr("executionCount", self.execution_count)
            .with_attr("status", to_attr_value(&self.status))
            .with_attr("output", self.output.clone())
            .with_content(vec![text_leaf(&self.code)])
    }
}

impl TreeCodec for MathBlock {
    /// Reads both block `math` nodes and inline `inlineMath` nodes. Inline
    /// math defaults to non-display mode.
    fn from_node(node: &TreeNode) -> Self {
        Self {
            latex: attr_string(node, "latex"),
            display_mode: node.attr_bool("displayMode").unwrap_or(node.node_type == nt::MATH),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::MATH)
            .with_attr("latex", self.latex.as_str())
            .with_attr("displayMode", self.display_mode)
    }
}

impl TreeCodec for DiagramBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self { syntax: attr_string(node, "syntax"), source: node.plain_text() }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::DIAGRAM)
            .with_attr("syntax", self.syntax.as_str())
            .with_content(vec![text_leaf(&self.source)])
    }
}

impl TreeCodec for QueryBlock {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            connection: attr_opt_string(node, "connection"),
            sql: node.plain_text(),
            result: node.attr("result").filter(|value| !value.is_null()).cloned(),
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode::new(nt::QUERY)
            .with_attr("connection", self.connection.clone())
            .with_attr("result", self.result.clone())
            .with_content(vec![text_leaf(&self.sql)])
    }
}
