// Tree format exchanged with the editing surface.
//
// A `document` root whose children are the flat, top-level block sequence.
// Nested `content` only ever carries textual payload (paragraphs, list items,
// table cells, inline nodes), never further document-level nesting.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DOCUMENT_NODE: &str = "document";
pub const TEXT_NODE: &str = "text";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TreeNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self { node_type: node_type.into(), attrs: None, content: None, text: None }
    }

    pub fn document(children: Vec<TreeNode>) -> Self {
        Self::new(DOCUMENT_NODE).with_content(children)
    }

    /// A raw text leaf. Converters go through `convert::text_leaf` instead,
    /// which applies the empty-text placeholder.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::new(TEXT_NODE) }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.get_or_insert_with(Map::new).insert(key.to_string(), value.into());
        self
    }

    pub fn with_content(mut self, children: Vec<TreeNode>) -> Self {
        self.content = Some(children);
        self
    }

    pub fn is_document(&self) -> bool {
        self.node_type == DOCUMENT_NODE
    }

    pub fn is_text(&self) -> bool {
        self.node_type == TEXT_NODE
    }

    pub fn children(&self) -> &[TreeNode] {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(key))
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attr(key).and_then(Value::as_bool)
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(Value::as_i64)
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(Value::as_f64)
    }

    /// Concatenated text of this node's subtree.
    ///
    /// Inline siblings are joined directly; block-level siblings (nodes that
    /// carry their own content) are separated by newlines.
    pub fn plain_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        let children = self.children();
        let separator = if children.iter().any(|child| child.content.is_some()) { "\n" } else { "" };
        children.iter().map(TreeNode::plain_text).collect::<Vec<_>>().join(separator)
    }
}
