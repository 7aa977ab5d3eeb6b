use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of a glyph (e-class). Producers emit either integers or strings,
/// and the two never compare equal: `2` and `"2"` are different glyphs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlyphId {
    Index(i64),
    Name(String),
}

impl GlyphId {
    /// Reads an id out of loosely-typed JSON. Integral numbers and strings are
    /// accepted; `null`, fractional and non-finite numbers are not ids.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                if let Some(index) = number.as_i64() {
                    return Some(Self::Index(index));
                }
                let float = number.as_f64()?;
                let integral = float.is_finite()
                    && float.fract() == 0.0
                    && float >= i64::MIN as f64
                    && float <= i64::MAX as f64;
                integral.then_some(Self::Index(float as i64))
            }
            Value::String(name) => Some(Self::Name(name.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for GlyphId {
    fn from(value: i64) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for GlyphId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: u64,
    pub end: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_span: Option<SourceSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_history: Option<Vec<String>>,
    /// Opaque analysis payload; an explicit `null` is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub semiring_trace: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Edge ids are kept as text; integer ids from producers become their decimal
/// spelling.
fn edge_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    GlyphId::deserialize(deserializer).map(|id| id.to_string())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
}

impl LayoutHint {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    pub fn is_pinned(&self) -> bool {
        self.fixed == Some(true) && self.position().is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutHint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    pub id: GlyphId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ache: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_hints: Option<ViewHints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl Glyph {
    pub fn layout_hint(&self) -> Option<&LayoutHint> {
        self.view_hints.as_ref()?.layout.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(deserialize_with = "edge_id")]
    pub id: String,
    pub source: GlyphId,
    pub target: GlyphId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_hints: Option<ViewHints>,
    /// Rewrite iteration that introduced the edge, when the producer records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphIr {
    pub glyphs: Vec<Glyph>,
    pub edges: Vec<Edge>,
}

impl GraphIr {
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

pub fn serialize_ir(ir: &GraphIr) -> Result<String> {
    serde_json::to_string_pretty(ir).context("failed to encode glyph IR as JSON")
}

pub fn deserialize_ir(text: &str) -> Result<GraphIr> {
    serde_json::from_str(text).context("invalid glyph IR JSON")
}
