// Directory meta - the `.meta.json` sidecar declaring a directory's icon and
// the schema its documents are checked against.

use crate::error::{MdTreeError, Result};
use crate::relation::RelationFieldValue;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// File name of the directory meta sidecar.
pub const META_FILE_NAME: &str = ".meta.json";

#[derive(Debug, Serialize, Deserialize)]
struct RawDirectoryMeta {
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    schema: Option<Schema>,
}

/// Parsed directory meta with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryMetaValue {
    icon: String,
    schema: Schema,
}

impl DirectoryMetaValue {
    pub fn new(icon: impl Into<String>, schema: Schema) -> Self {
        DirectoryMetaValue {
            icon: icon.into(),
            schema,
        }
    }

    /// Meta for a directory that has no sidecar file.
    pub fn empty(fallback_icon: &str) -> Self {
        Self::new(fallback_icon, Schema::new())
    }

    pub fn from_json(text: &str, fallback_icon: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value, fallback_icon)
    }

    pub fn from_value(value: serde_json::Value, fallback_icon: &str) -> Result<Self> {
        if !value.is_object() {
            return Err(MdTreeError::InvalidShape(format!(
                "Directory meta must be a JSON object, got {value}"
            )));
        }
        let raw: RawDirectoryMeta = serde_json::from_value(value)
            .map_err(|e| MdTreeError::InvalidShape(format!("Invalid directory meta: {e}")))?;
        Ok(DirectoryMetaValue {
            icon: raw.icon.unwrap_or_else(|| fallback_icon.to_string()),
            schema: raw.schema.unwrap_or_default(),
        })
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn with_icon(&self, icon: impl Into<String>) -> Self {
        Self::new(icon, self.schema.clone())
    }

    pub fn with_schema(&self, schema: Schema) -> Self {
        Self::new(self.icon.clone(), schema)
    }

    pub fn relations(&self) -> Vec<RelationFieldValue> {
        self.schema
            .iter()
            .filter_map(|(key, entry)| RelationFieldValue::from_schema_entry(key, entry))
            .collect()
    }

    /// Pretty-printed sidecar contents.
    pub fn to_json(&self) -> Result<String> {
        let raw = RawDirectoryMeta {
            icon: Some(self.icon.clone()),
            schema: Some(self.schema.clone()),
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}
