// Tree↔block conversion.
//
// Forward (node → payload) dispatches through `FORWARD`, a table keyed by
// tree node type. Reverse (payload → node) is an exhaustive match over
// `BlockPayload`, so a new kind does not compile until both directions
// exist.

use tracing::debug;

use crate::block::{BlockPayload, TextBlock};
use crate::tree::TreeNode;

mod code;
mod media;
mod structured;
mod text;

/// Substituted for empty or whitespace-only text. The editor rejects
/// literally empty text nodes.
pub const PLACEHOLDER_TEXT: &str = " ";

pub mod node_types {
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const BLOCKQUOTE: &str = "blockquote";
    pub const CALLOUT: &str = "callout";
    pub const TOGGLE: &str = "toggle";
    pub const FOOTNOTE: &str = "footnote";
    pub const BULLET_LIST: &str = "bulletList";
    pub const ORDERED_LIST: &str = "orderedList";
    pub const LIST_ITEM: &str = "listItem";
    pub const TASK_LIST: &str = "taskList";
    pub const TASK_ITEM: &str = "taskItem";
    pub const HORIZONTAL_RULE: &str = "horizontalRule";
    pub const CODE_BLOCK: &str = "codeBlock";
    pub const EXECUTABLE_CODE: &str = "executableCode";
    pub const MATH: &str = "math";
    pub const INLINE_MATH: &str = "inlineMath";
    pub const DIAGRAM: &str = "diagram";
    pub const QUERY: &str = "query";
    pub const TABLE: &str = "table";
    pub const TABLE_ROW: &str = "tableRow";
    pub const TABLE_HEADER: &str = "tableHeader";
    pub const TABLE_CELL: &str = "tableCell";
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
    pub const EMBED: &str = "embed";
    pub const FILE_ATTACHMENT: &str = "fileAttachment";
    pub const CITATION: &str = "citation";
    pub const BIBLIOGRAPHY: &str = "bibliography";
    pub const CHART: &str = "chart";
    pub const METRIC: &str = "metric";
    pub const PIPELINE: &str = "pipeline";
    pub const GRAPH: &str = "graph";
    pub const SUB_DOCUMENT_LINK: &str = "subDocumentLink";
}

use node_types as nt;

/// Per-kind mapping between a payload struct and its tree node shape.
pub trait TreeCodec: Sized {
    fn from_node(node: &TreeNode) -> Self;
    fn to_node(&self) -> TreeNode;
}

struct ForwardEntry {
    node_type: &'static str,
    convert: fn(&TreeNode) -> BlockPayload,
}

fn decode<T>(node: &TreeNode) -> BlockPayload
where
    T: TreeCodec + Into<BlockPayload>,
{
    T::from_node(node).into()
}

static FORWARD: &[ForwardEntry] = &[
    ForwardEntry { node_type: nt::PARAGRAPH, convert: convert_paragraph },
    ForwardEntry { node_type: nt::HEADING, convert: decode::<crate::block::HeadingBlock> },
    ForwardEntry { node_type: nt::BLOCKQUOTE, convert: decode::<crate::block::QuoteBlock> },
    ForwardEntry { node_type: nt::CALLOUT, convert: decode::<crate::block::CalloutBlock> },
    ForwardEntry { node_type: nt::TOGGLE, convert: decode::<crate::block::ToggleBlock> },
    ForwardEntry { node_type: nt::FOOTNOTE, convert: decode::<crate::block::FootnoteBlock> },
    ForwardEntry { node_type: nt::BULLET_LIST, convert: decode::<crate::block::ListBlock> },
    ForwardEntry { node_type: nt::ORDERED_LIST, convert: decode::<crate::block::ListBlock> },
    ForwardEntry { node_type: nt::TASK_LIST, convert: decode::<crate::block::TaskListBlock> },
    ForwardEntry { node_type: nt::HORIZONTAL_RULE, convert: decode::<crate::block::DividerBlock> },
    ForwardEntry { node_type: nt::CODE_BLOCK, convert: decode::<crate::block::CodeBlock> },
    ForwardEntry {
        node_type: nt::EXECUTABLE_CODE,
        convert: decode::<crate::block::ExecutableCodeBlock>,
    },
    ForwardEntry { node_type: nt::MATH, convert: decode::<crate::block::MathBlock> },
    ForwardEntry { node_type: nt::DIAGRAM, convert: decode::<crate::block::DiagramBlock> },
    ForwardEntry { node_type: nt::QUERY, convert: decode::<crate::block::QueryBlock> },
    ForwardEntry { node_type: nt::TABLE, convert: decode::<crate::block::TableBlock> },
    ForwardEntry { node_type: nt::IMAGE, convert: decode::<crate::block::ImageBlock> },
    ForwardEntry { node_type: nt::VIDEO, convert: decode::<crate::block::VideoBlock> },
    ForwardEntry { node_type: nt::EMBED, convert: decode::<crate::block::EmbedBlock> },
    ForwardEntry {
        node_type: nt::FILE_ATTACHMENT,
        convert: decode::<crate::block::FileAttachmentBlock>,
    },
    ForwardEntry { node_type: nt::CITATION, convert: decode::<crate::block::CitationBlock> },
    ForwardEntry {
        node_type: nt::BIBLIOGRAPHY,
        convert: decode::<crate::block::BibliographyBlock>,
    },
    ForwardEntry { node_type: nt::CHART, convert: decode::<crate::block::ChartBlock> },
    ForwardEntry { node_type: nt::METRIC, convert: decode::<crate::block::MetricBlock> },
    ForwardEntry { node_type: nt::PIPELINE, convert: decode::<crate::block::PipelineBlock> },
    ForwardEntry { node_type: nt::GRAPH, convert: decode::<crate::block::GraphBlock> },
    ForwardEntry {
        node_type: nt::SUB_DOCUMENT_LINK,
        convert: decode::<crate::block::SubDocumentLinkBlock>,
    },
];

/// Inline nodes that turn their enclosing paragraph into a specialized block.
static INLINE_SPECIALIZATIONS: &[ForwardEntry] = &[
    ForwardEntry {
        node_type: nt::SUB_DOCUMENT_LINK,
        convert: decode::<crate::block::SubDocumentLinkBlock>,
    },
    ForwardEntry { node_type: nt::CITATION, convert: decode::<crate::block::CitationBlock> },
    ForwardEntry { node_type: nt::INLINE_MATH, convert: decode::<crate::block::MathBlock> },
];

/// Convert one top-level tree node into a block payload.
///
/// Node types without a registered converter become a text block naming
/// the type; the node's attributes are dropped.
pub fn block_from_node(node: &TreeNode) -> BlockPayload {
    match FORWARD.iter().find(|entry| entry.node_type == node.node_type) {
        Some(entry) => (entry.convert)(node),
        None => {
            debug!(node_type = %node.node_type, "no converter for node type, storing placeholder text");
            TextBlock::new(unsupported_text(&node.node_type)).into()
        }
    }
}

pub fn unsupported_text(node_type: &str) -> String {
    format!("[Unsupported block: {node_type}]")
}

/// Render one block payload as a top-level tree node.
pub fn node_from_block(payload: &BlockPayload) -> TreeNode {
    match payload {
        BlockPayload::Heading(b) => b.to_node(),
        BlockPayload::Text(b) => b.to_node(),
        BlockPayload::Code(b) => b.to_node(),
        BlockPayload::ExecutableCode(b) => b.to_node(),
        BlockPayload::Math(b) => b.to_node(),
        BlockPayload::Table(b) => b.to_node(),
        BlockPayload::Image(b) => b.to_node(),
        BlockPayload::Quote(b) => b.to_node(),
        BlockPayload::List(b) => b.to_node(),
        BlockPayload::TaskList(b) => b.to_node(),
        BlockPayload::Divider(b) => b.to_node(),
        BlockPayload::Callout(b) => b.to_node(),
        BlockPayload::Toggle(b) => b.to_node(),
        BlockPayload::Citation(b) => b.to_node(),
        BlockPayload::Bibliography(b) => b.to_node(),
        BlockPayload::Footnote(b) => b.to_node(),
        BlockPayload::Diagram(b) => b.to_node(),
        BlockPayload::Embed(b) => b.to_node(),
        BlockPayload::Video(b) => b.to_node(),
        BlockPayload::FileAttachment(b) => b.to_node(),
        BlockPayload::Chart(b) => b.to_node(),
        BlockPayload::Query(b) => b.to_node(),
        BlockPayload::Metric(b) => b.to_node(),
        BlockPayload::Pipeline(b) => b.to_node(),
        BlockPayload::Graph(b) => b.to_node(),
        BlockPayload::SubDocumentLink(b) => b.to_node(),
    }
}

/// Assemble a `document` tree from payloads already in reading order.
pub fn tree_from_blocks<'a, I>(payloads: I) -> TreeNode
where
    I: IntoIterator<Item = &'a BlockPayload>,
{
    TreeNode::document(payloads.into_iter().map(node_from_block).collect())
}

/// A paragraph is specialized only when nothing but whitespace surrounds its
/// specialized inline nodes; the first such node decides the block.
fn convert_paragraph(node: &TreeNode) -> BlockPayload {
    let mut first = None;
    let mut has_prose = false;
    for child in node.children() {
        match INLINE_SPECIALIZATIONS.iter().find(|entry| entry.node_type == child.node_type) {
            Some(entry) => {
                first.get_or_insert((entry, child));
            }
            None if is_blank_text(child) => {}
            None => has_prose = true,
        }
    }
    match first {
        Some((entry, child)) if !has_prose => (entry.convert)(child),
        Some((entry, _)) => {
            debug!(inline = entry.node_type, "paragraph mixes prose with inline nodes, keeping it as text");
            decode::<TextBlock>(node)
        }
        None => decode::<TextBlock>(node),
    }
}

fn is_blank_text(node: &TreeNode) -> bool {
    node.is_text() && node.text.as_deref().unwrap_or_default().trim().is_empty()
}

// ── Shared node builders ───────────────────────────────────────────

/// A text leaf, with empty or whitespace-only text replaced by the placeholder.
pub fn text_leaf(text: &str) -> TreeNode {
    if text.trim().is_empty() {
        TreeNode::text(PLACEHOLDER_TEXT)
    } else {
        TreeNode::text(text)
    }
}

pub(crate) fn paragraph(text: &str) -> TreeNode {
    TreeNode::new(nt::PARAGRAPH).with_content(vec![text_leaf(text)])
}

/// Read an attribute into a typed value, falling back to the default when
/// the attribute is absent or has the wrong shape.
pub(crate) fn attr_as<T>(node: &TreeNode, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    node.attr(key).and_then(|value| serde_json::from_value(value.clone()).ok()).unwrap_or_default()
}

pub(crate) fn attr_string(node: &TreeNode, key: &str) -> String {
    node.attr_str(key).unwrap_or_default().to_string()
}

pub(crate) fn attr_opt_string(node: &TreeNode, key: &str) -> Option<String> {
    node.attr_str(key).map(str::to_string)
}

pub(crate) fn to_attr_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
