//! Normalized field specifications.
//!
//! A [`FieldSpec`] describes the shape of one configuration field: its
//! dotted path, control type, labels and validation metadata. Values are
//! owned by the form binding, never by the spec.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Control type of a field, mirroring the JSON-Schema `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    /// Parse a JSON-Schema type name. Unsupported names return `None`.
    pub fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FieldKind::String),
            "integer" => Some(FieldKind::Integer),
            "boolean" => Some(FieldKind::Boolean),
            "array" => Some(FieldKind::Array),
            "object" => Some(FieldKind::Object),
            _ => None,
        }
    }

    /// Infer a kind from a literal value (used when `type` is omitted).
    pub fn from_literal(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(FieldKind::String),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(FieldKind::Integer),
            Value::Bool(_) => Some(FieldKind::Boolean),
            Value::Array(_) => Some(FieldKind::Array),
            Value::Object(_) => Some(FieldKind::Object),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Array => write!(f, "array"),
            FieldKind::Object => write!(f, "object"),
        }
    }
}

/// One renderer-facing configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Dotted path, unique within a rendering pass (e.g. `config.ssl_mode.mode`)
    pub field: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    pub title: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default)]
    pub secret: bool,

    /// Allowed literal values. For branching objects these are the branch labels.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    pub order: i64,

    /// Branch label under which this field is visible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specs: Vec<FieldSpec>,

    #[serde(default)]
    pub multiline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    /// Discriminant key of a `oneOf` object (`None` for plain groups and leaves)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminant: Option<String>,
}

impl FieldSpec {
    /// Create a bare spec with no optional attributes set.
    pub fn new(field: impl Into<String>, kind: FieldKind, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            title: title.into(),
            required: false,
            default: None,
            secret: false,
            options: Vec::new(),
            const_value: None,
            order: 0,
            parent: None,
            specs: Vec::new(),
            multiline: false,
            pattern: None,
            description: None,
            placeholder: None,
            minimum: None,
            maximum: None,
            discriminant: None,
        }
    }

    /// True for objects that select one child branch through a dropdown.
    ///
    /// A `oneOf` whose branches share no discriminant still counts: it
    /// renders as a dropdown, just without sub-fields.
    pub fn is_branching(&self) -> bool {
        self.kind == FieldKind::Object && !self.options.is_empty()
    }

    /// True for objects whose children are always visible and that carry no value.
    pub fn is_group(&self) -> bool {
        self.kind == FieldKind::Object && self.options.is_empty()
    }

    /// Whether this spec owns a bound value in the form binding.
    pub fn has_value(&self) -> bool {
        !self.is_group()
    }

    /// Child specs visible while `branch` is selected.
    pub fn children_for<'a>(&'a self, branch: &str) -> impl Iterator<Item = &'a FieldSpec> + use<'a> {
        let branch = branch.to_string();
        self.specs
            .iter()
            .filter(move |child| child.parent.as_deref() == Some(branch.as_str()))
    }

    /// The const value rendered as display text, if any.
    pub fn const_text(&self) -> Option<String> {
        self.const_value.as_ref().map(literal_text)
    }
}

/// Render a JSON literal as plain text (strings without quotes).
pub fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
