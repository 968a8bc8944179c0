// Kind-specific block payloads.
//
// One struct per kind, wrapped by the closed `BlockPayload` enum. The enum
// is internally tagged with `kind`, which is how payloads are persisted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BlockKind, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockPayload {
    Heading(HeadingBlock),
    Text(TextBlock),
    Code(CodeBlock),
    ExecutableCode(ExecutableCodeBlock),
    Math(MathBlock),
    Table(TableBlock),
    Image(ImageBlock),
    Quote(QuoteBlock),
    List(ListBlock),
    TaskList(TaskListBlock),
    Divider(DividerBlock),
    Callout(CalloutBlock),
    Toggle(ToggleBlock),
    Citation(CitationBlock),
    Bibliography(BibliographyBlock),
    Footnote(FootnoteBlock),
    Diagram(DiagramBlock),
    Embed(EmbedBlock),
    Video(VideoBlock),
    FileAttachment(FileAttachmentBlock),
    Chart(ChartBlock),
    Query(QueryBlock),
    Metric(MetricBlock),
    Pipeline(PipelineBlock),
    Graph(GraphBlock),
    SubDocumentLink(SubDocumentLinkBlock),
}

macro_rules! payload_from {
    ($($variant:ident($ty:ident)),* $(,)?) => {
        $(
            impl From<$ty> for BlockPayload {
                fn from(block: $ty) -> Self {
                    BlockPayload::$variant(block)
                }
            }
        )*
    };
}

payload_from!(
    Heading(HeadingBlock),
    Text(TextBlock),
    Code(CodeBlock),
    ExecutableCode(ExecutableCodeBlock),
    Math(MathBlock),
    Table(TableBlock),
    Image(ImageBlock),
    Quote(QuoteBlock),
    List(ListBlock),
    TaskList(TaskListBlock),
    Divider(DividerBlock),
    Callout(CalloutBlock),
    Toggle(ToggleBlock),
    Citation(CitationBlock),
    Bibliography(BibliographyBlock),
    Footnote(FootnoteBlock),
    Diagram(DiagramBlock),
    Embed(EmbedBlock),
    Video(VideoBlock),
    FileAttachment(FileAttachmentBlock),
    Chart(ChartBlock),
    Query(QueryBlock),
    Metric(MetricBlock),
    Pipeline(PipelineBlock),
    Graph(GraphBlock),
    SubDocumentLink(SubDocumentLinkBlock),
);

impl BlockPayload {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Heading(_) => BlockKind::Heading,
            Self::Text(_) => BlockKind::Text,
            Self::Code(_) => BlockKind::Code,
            Self::ExecutableCode(_) => BlockKind::ExecutableCode,
            Self::Math(_) => BlockKind::Math,
            Self::Table(_) => BlockKind::Table,
            Self::Image(_) => BlockKind::Image,
            Self::Quote(_) => BlockKind::Quote,
            Self::List(_) => BlockKind::List,
            Self::TaskList(_) => BlockKind::TaskList,
            Self::Divider(_) => BlockKind::Divider,
            Self::Callout(_) => BlockKind::Callout,
            Self::Toggle(_) => BlockKind::Toggle,
            Self::Citation(_) => BlockKind::Citation,
            Self::Bibliography(_) => BlockKind::Bibliography,
            Self::Footnote(_) => BlockKind::Footnote,
            Self::Diagram(_) => BlockKind::Diagram,
            Self::Embed(_) => BlockKind::Embed,
            Self::Video(_) => BlockKind::Video,
            Self::FileAttachment(_) => BlockKind::FileAttachment,
            Self::Chart(_) => BlockKind::Chart,
            Self::Query(_) => BlockKind::Query,
            Self::Metric(_) => BlockKind::Metric,
            Self::Pipeline(_) => BlockKind::Pipeline,
            Self::Graph(_) => BlockKind::Graph,
            Self::SubDocumentLink(_) => BlockKind::SubDocumentLink,
        }
    }

    /// Text shown when listing the block, if the kind has any.
    pub fn preview_text(&self) -> Option<&str> {
        match self {
            Self::Heading(b) => Some(&b.text),
            Self::Text(b) => Some(&b.text),
            Self::Code(b) => Some(&b.code),
            Self::ExecutableCode(b) => Some(&b.code),
            Self::Math(b) => Some(&b.latex),
            Self::Quote(b) => Some(&b.text),
            Self::Callout(b) => Some(&b.text),
            Self::Toggle(b) => Some(&b.summary),
            Self::Footnote(b) => Some(&b.text),
            Self::Diagram(b) => Some(&b.source),
            Self::Query(b) => Some(&b.sql),
            Self::Citation(b) => Some(&b.key),
            Self::Metric(b) => Some(&b.label),
            Self::Pipeline(b) => Some(&b.name),
            Self::Image(b) => b.caption.as_deref().or(b.alt.as_deref()),
            Self::Video(b) => b.caption.as_deref(),
            Self::FileAttachment(b) => Some(&b.name),
            Self::SubDocumentLink(b) => b.title.as_deref(),
            Self::Table(_)
            | Self::List(_)
            | Self::TaskList(_)
            | Self::Divider(_)
            | Self::Bibliography(_)
            | Self::Embed(_)
            | Self::Chart(_)
            | Self::Graph(_) => None,
        }
    }

    /// Check kind-required fields.
    ///
    /// The repository logs failures instead of rejecting the block, so a
    /// malformed block can still be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Heading(b) if !(1..=6).contains(&b.level) => {
                Err(ValidationError::HeadingLevel(b.level))
            }
            Self::Image(b) => require(BlockKind::Image, "src", &b.src),
            Self::Video(b) => require(BlockKind::Video, "src", &b.src),
            Self::Embed(b) => require(BlockKind::Embed, "url", &b.url),
            Self::FileAttachment(b) => require(BlockKind::FileAttachment, "url", &b.url),
            Self::Citation(b) => require(BlockKind::Citation, "key", &b.key),
            Self::Chart(b) => require(BlockKind::Chart, "data_source", &b.data_source),
            Self::SubDocumentLink(b) => {
                require(BlockKind::SubDocumentLink, "document_id", &b.document_id)
            }
            Self::Table(b) => b.validate_rows(),
            _ => Ok(()),
        }
    }

    /// Merge persisted-form fields into a copy of this payload.
    ///
    /// Unknown fields, a `kind` that differs from the current one, and
    /// values of the wrong shape are rejected.
    pub fn merge_fields(&self, fields: &Map<String, Value>) -> Result<BlockPayload, ValidationError> {
        let kind = self.kind();
        let invalid = |reason: String| ValidationError::InvalidPatch { kind, reason };

        let mut value = serde_json::to_value(self).map_err(|e| invalid(e.to_string()))?;
        let Value::Object(object) = &mut value else {
            return Err(invalid("payload is not an object".into()));
        };

        for (field, new_value) in fields {
            if field == "kind" {
                if new_value.as_str() != Some(kind.as_str()) {
                    return Err(invalid("block kind cannot change".into()));
                }
                continue;
            }
            if !object.contains_key(field) {
                return Err(invalid(format!("unknown field `{field}`")));
            }
            object.insert(field.clone(), new_value.clone());
        }

        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }
}

fn require(kind: BlockKind, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { kind, field })
    } else {
        Ok(())
    }
}

// ── Text-like kinds ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingBlock {
    pub level: u8,
    pub text: String,
}

impl HeadingBlock {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self { level, text: text.into() }
    }
}

impl Default for HeadingBlock {
    fn default() -> Self {
        Self { level: 1, text: String::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlock {
    pub text: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteBlock {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalloutBlock {
    /// Presentation hint such as `info`, `warning` or `danger`.
    pub variant: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleBlock {
    pub summary: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootnoteBlock {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListBlock {
    pub ordered: bool,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskListBlock {
    pub items: Vec<TaskItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskItem {
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividerBlock {}

// ── Code and math ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

impl CodeBlock {
    pub fn new(language: Option<&str>, code: impl Into<String>) -> Self {
        Self { language: language.map(str::to_string), code: code.into() }
    }
}

/// A code cell that runs against a kernel session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutableCodeBlock {
    pub language: String,
    pub code: String,
    pub output: Option<String>,
    pub session_id: Option<String>,
    pub execution_count: Option<u32>,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathBlock {
    pub latex: String,
    pub display_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramBlock {
    /// Diagram language, e.g. `mermaid` or `graphviz`.
    pub syntax: String,
    pub source: String,
}

// ── Tables and media ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    fn validate_rows(&self) -> Result<(), ValidationError> {
        for (row, cells) in self.rows.iter().enumerate() {
            if !self.headers.is_empty() && cells.len() > self.headers.len() {
                return Err(ValidationError::RaggedTableRow {
                    row,
                    width: cells.len(),
                    headers: self.headers.len(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBlock {
    pub src: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoBlock {
    pub src: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedBlock {
    pub url: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAttachmentBlock {
    pub name: String,
    pub url: String,
    pub size: Option<u64>,
}

// ── Scholarly ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationBlock {
    pub key: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibliographyBlock {
    pub style: String,
    /// Citation keys, in display order.
    pub entries: Vec<String>,
}

// ── Analytics and pipelines ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartBlock {
    pub chart_type: String,
    /// Reference to the query or dataset feeding the chart.
    pub data_source: String,
    pub config: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryBlock {
    pub connection: Option<String>,
    pub sql: String,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricBlock {
    pub label: String,
    pub value: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineBlock {
    pub name: String,
    pub steps: Vec<PipelineStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineStep {
    pub id: String,
    pub name: String,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBlock {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

// ── Cross-document ─────────────────────────────────────────────────

/// Link to another document, rendered inline inside a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubDocumentLinkBlock {
    pub document_id: String,
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_is_tagged_with_kind() {
        let payload = BlockPayload::from(HeadingBlock::new(2, "Setup"));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "kind": "heading", "level": 2, "text": "Setup" }));

        let back: BlockPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn divider_persists_as_bare_kind() {
        let value = serde_json::to_value(BlockPayload::from(DividerBlock {})).unwrap();
        assert_eq!(value, json!({ "kind": "divider" }));
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let payload: BlockPayload =
            serde_json::from_value(json!({ "kind": "executable_code", "code": "1 + 1" })).unwrap();
        let BlockPayload::ExecutableCode(cell) = payload else {
            panic!("expected executable code payload");
        };
        assert_eq!(cell.code, "1 + 1");
        assert_eq!(cell.status, ExecutionStatus::Idle);
        assert!(cell.session_id.is_none());
    }

    #[test]
    fn validate_rejects_sub_document_link_without_target() {
        let payload = BlockPayload::from(SubDocumentLinkBlock::default());
        assert_eq!(
            payload.validate(),
            Err(ValidationError::MissingField {
                kind: BlockKind::SubDocumentLink,
                field: "document_id",
            })
        );
    }

    #[test]
    fn validate_checks_heading_level_and_table_width() {
        assert_eq!(
            BlockPayload::from(HeadingBlock::new(9, "x")).validate(),
            Err(ValidationError::HeadingLevel(9))
        );
        assert!(BlockPayload::from(HeadingBlock::new(6, "x")).validate().is_ok());

        let table = TableBlock {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into()], vec!["2".into(), "3".into()]],
        };
        assert_eq!(
            BlockPayload::from(table).validate(),
            Err(ValidationError::RaggedTableRow { row: 1, width: 2, headers: 1 })
        );
    }

    #[test]
    fn merge_fields_updates_known_fields() {
        let payload = BlockPayload::from(HeadingBlock::new(1, "Intro"));
        let mut fields = Map::new();
        fields.insert("text".into(), json!("Overview"));
        fields.insert("level".into(), json!(2));

        let merged = payload.merge_fields(&fields).unwrap();
        assert_eq!(merged, BlockPayload::from(HeadingBlock::new(2, "Overview")));
    }

    #[test]
    fn merge_fields_rejects_kind_change_and_unknown_fields() {
        let payload = BlockPayload::from(TextBlock::new("hello"));

        let mut kind_change = Map::new();
        kind_change.insert("kind".into(), json!("heading"));
        assert!(matches!(
            payload.merge_fields(&kind_change),
            Err(ValidationError::InvalidPatch { kind: BlockKind::Text, .. })
        ));

        let mut unknown = Map::new();
        unknown.insert("level".into(), json!(1));
        assert!(payload.merge_fields(&unknown).is_err());

        let mut wrong_shape = Map::new();
        wrong_shape.insert("text".into(), json!(42));
        assert!(payload.merge_fields(&wrong_shape).is_err());
    }

    #[test]
    fn preview_text_picks_content_field() {
        assert_eq!(BlockPayload::from(TextBlock::new("body")).preview_text(), Some("body"));
        assert_eq!(BlockPayload::from(CodeBlock::new(Some("rust"), "fn main() {}")).preview_text(), Some("fn main() {}"));
        assert_eq!(BlockPayload::from(DividerBlock {}).preview_text(), None);
    }
}
