// Block records: the flat, individually addressable units a document tree
// decomposes into.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumIter, EnumString, IntoStaticStr};

pub mod payload;
pub mod reference;
pub mod validation;

pub use payload::*;
pub use reference::{is_composite, make_ref, parse_ref, BlockRef, REF_DELIMITER};
pub use validation::ValidationError;

/// The closed set of block varieties.
///
/// Each kind owns its own id partition in storage. The snake_case tag is
/// the prefix of the kind's composite references and the `kind` field of
/// the persisted payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Text,
    Code,
    ExecutableCode,
    Math,
    Table,
    Image,
    Quote,
    List,
    TaskList,
    Divider,
    Callout,
    Toggle,
    Citation,
    Bibliography,
    Footnote,
    Diagram,
    Embed,
    Video,
    FileAttachment,
    Chart,
    Query,
    Metric,
    Pipeline,
    Graph,
    SubDocumentLink,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Parse a snake_case kind tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        <Self as FromStr>::from_str(tag).ok()
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Kind-local id, unique only within the kind's partition.
    pub id: i64,
    pub document_id: String,
    /// Position hint. Independent of the document structure's reference order.
    pub order: i64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payload: BlockPayload,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    pub fn reference(&self) -> BlockRef {
        make_ref(self.kind(), self.id)
    }
}

/// A block that has not been stored yet: no id, no version, no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDraft {
    pub document_id: String,
    pub order: i64,
    pub payload: BlockPayload,
}

impl BlockDraft {
    pub fn new(document_id: impl Into<String>, order: i64, payload: impl Into<BlockPayload>) -> Self {
        Self { document_id: document_id.into(), order, payload: payload.into() }
    }

    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }
}

/// A partial update merged into an existing block.
///
/// `fields` are payload field names in their persisted (snake_case) form.
/// The kind of a block never changes through a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_none() && self.fields.is_empty()
    }
}
