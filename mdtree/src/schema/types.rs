use crate::error::{MdTreeError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

/// Field schema declaration: property name to entry, in declaration order.
pub type Schema = IndexMap<String, FieldSchemaEntry>;

/// The closed set of field type variants a schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    SelectText,
    SelectNumber,
    Relation,
    MultiText,
    MultiNumber,
    MultiSelectText,
    MultiSelectNumber,
    MultiRelation,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::SelectText,
        FieldType::SelectNumber,
        FieldType::Relation,
        FieldType::MultiText,
        FieldType::MultiNumber,
        FieldType::MultiSelectText,
        FieldType::MultiSelectNumber,
        FieldType::MultiRelation,
    ];

    /// Parse a raw tag such as `"multi-select-text"`.
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| MdTreeError::InvalidFieldType {
                tag: tag.to_string(),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::SelectText => "select-text",
            FieldType::SelectNumber => "select-number",
            FieldType::Relation => "relation",
            FieldType::MultiText => "multi-text",
            FieldType::MultiNumber => "multi-number",
            FieldType::MultiSelectText => "multi-select-text",
            FieldType::MultiSelectNumber => "multi-select-number",
            FieldType::MultiRelation => "multi-relation",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldType::MultiText
                | FieldType::MultiNumber
                | FieldType::MultiSelectText
                | FieldType::MultiSelectNumber
                | FieldType::MultiRelation
        )
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldType::Relation | FieldType::MultiRelation)
    }

    pub fn is_select(&self) -> bool {
        matches!(
            self,
            FieldType::SelectText
                | FieldType::SelectNumber
                | FieldType::MultiSelectText
                | FieldType::MultiSelectNumber
        )
    }

    /// The scalar kind with `multi-` and `select-` stripped.
    /// Always one of `Text`, `Number`, `Boolean` or `Relation`.
    pub fn base_type(&self) -> FieldType {
        match self {
            FieldType::Text
            | FieldType::SelectText
            | FieldType::MultiText
            | FieldType::MultiSelectText => FieldType::Text,
            FieldType::Number
            | FieldType::SelectNumber
            | FieldType::MultiNumber
            | FieldType::MultiSelectNumber => FieldType::Number,
            FieldType::Boolean => FieldType::Boolean,
            FieldType::Relation | FieldType::MultiRelation => FieldType::Relation,
        }
    }

    pub fn default_value(&self) -> Value {
        if self.is_array() {
            return Value::Sequence(Vec::new());
        }
        match self.base_type() {
            FieldType::Number => Value::Number(0.into()),
            FieldType::Boolean => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }

    /// Exact runtime-type check, no coercion: `"123"` is not a number.
    pub fn validate_value(&self, value: &Value) -> bool {
        if self.is_array() {
            let base = self.base_type();
            return match value {
                Value::Sequence(items) => items.iter().all(|v| base.validate_scalar(v)),
                _ => false,
            };
        }
        self.base_type().validate_scalar(value)
    }

    fn validate_scalar(&self, value: &Value) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_bool(),
            _ => value.is_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = MdTreeError;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::from_tag(s)
    }
}

impl TryFrom<String> for FieldType {
    type Error = MdTreeError;

    fn try_from(tag: String) -> Result<Self> {
        FieldType::from_tag(&tag)
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

/// One declared field: its type, whether it is required, and display hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchemaEntry {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target directory, relation types only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Allowed values, select types only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSchemaEntry {
    pub fn new(field_type: FieldType) -> Self {
        FieldSchemaEntry {
            field_type,
            required: false,
            title: None,
            description: None,
            path: None,
            options: None,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_options(mut self, options: Vec<Value>) -> Self {
        self.options = Some(options);
        self
    }

    /// The value a fresh document starts with for this field.
    pub fn effective_default(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.field_type.default_value())
    }
}
