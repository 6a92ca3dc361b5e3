use crate::error::{MdTreeError, Result};
use crate::field::value::type_name;
use crate::meta::MetaValue;
use crate::schema::FieldSchemaEntry;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A pointer from one front-matter field into a directory of documents.
///
/// `file_path` names the target directory, absolute or relative to the
/// directory holding the owning document. `is_array` decides whether the field
/// holds one document key or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationFieldValue {
    field_name: String,
    file_path: String,
    is_array: bool,
}

impl RelationFieldValue {
    pub fn new(field_name: impl Into<String>, file_path: impl Into<String>, is_array: bool) -> Self {
        RelationFieldValue {
            field_name: field_name.into(),
            file_path: file_path.into(),
            is_array,
        }
    }

    /// Parse a raw `{fieldName, filePath, isArray}` object.
    pub fn from_value(raw: &Value) -> Result<Self> {
        serde_yaml::from_value(raw.clone()).map_err(|e| {
            MdTreeError::InvalidShape(format!(
                "Relation must be {{fieldName: string, filePath: string, isArray: boolean}}, got {} ({e})",
                type_name(raw)
            ))
        })
    }

    /// Relation described by a schema entry, `None` for non-relation types.
    pub fn from_schema_entry(key: &str, entry: &FieldSchemaEntry) -> Option<Self> {
        if !entry.field_type.is_relation() {
            return None;
        }
        Some(RelationFieldValue::new(
            key,
            entry.path.clone().unwrap_or_default(),
            entry.field_type.is_array(),
        ))
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Final segment of `file_path`, empty when `file_path` is.
    pub fn target_directory_name(&self) -> &str {
        self.file_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }

    /// `file_path` if absolute, otherwise `base_path/file_path`.
    /// Not normalized; callers resolve with their own path system.
    pub fn full_path(&self, base_path: &str) -> String {
        if self.file_path.starts_with('/') {
            self.file_path.clone()
        } else {
            format!("{}/{}", base_path, self.file_path)
        }
    }

    /// Document keys this relation holds in `meta`.
    ///
    /// A single relation yields at most one key; empty strings are dropped.
    pub fn keys(&self, meta: &MetaValue) -> Result<Vec<String>> {
        let raw = match meta.field(&self.field_name) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(raw) => raw,
        };
        let keys = match (self.is_array, raw) {
            (true, Value::Sequence(items)) => items
                .iter()
                .map(|item| self.key_of(item))
                .collect::<Result<Vec<_>>>()?,
            (false, Value::String(_)) => vec![self.key_of(raw)?],
            (_, other) => {
                return Err(MdTreeError::InvalidShape(format!(
                    "Relation field \"{}\" expected {}, got {}",
                    self.field_name,
                    if self.is_array { "list" } else { "string" },
                    type_name(other)
                )))
            }
        };
        Ok(keys.into_iter().filter(|k| !k.is_empty()).collect())
    }

    fn key_of(&self, item: &Value) -> Result<String> {
        item.as_str().map(str::to_string).ok_or_else(|| {
            MdTreeError::InvalidShape(format!(
                "Relation field \"{}\" holds a non-string key ({})",
                self.field_name,
                type_name(item)
            ))
        })
    }
}
