use crate::error::{MdTreeError, Result};
use crate::field::{value::type_name, AnyFieldValue};
use crate::relation::RelationFieldValue;
use crate::schema::{FieldSchemaEntry, Schema};
use serde_yaml::{Mapping, Value};

/// Result of type-checking a MetaValue against its schema
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Front matter of one document, paired with the schema it was checked against.
///
/// Construction fails if a required field is missing; after that the value is
/// never changed. `with_*` methods return a new MetaValue.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaValue {
    data: Mapping,
    schema: Schema,
}

impl MetaValue {
    pub fn new(data: Mapping, schema: Schema) -> Result<Self> {
        check_required(&data, &schema)?;
        Ok(MetaValue { data, schema })
    }

    /// Build from any YAML value; `null` is treated as an empty mapping.
    pub fn from_value(value: Value, schema: Schema) -> Result<Self> {
        match value {
            Value::Null => Self::new(Mapping::new(), schema),
            Value::Mapping(data) => Self::new(data, schema),
            other => Err(MdTreeError::InvalidShape(format!(
                "Front matter must be a mapping, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Every schema field set to its default, in schema order.
    pub fn defaults(schema: Schema) -> Result<Self> {
        let data = schema
            .iter()
            .map(|(key, entry)| (Value::String(key.clone()), entry.effective_default()))
            .collect();
        Self::new(data, schema)
    }

    pub fn value(&self) -> &Mapping {
        &self.data
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw stored value; no schema lookup.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Presence in the data only.
    pub fn has_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Schema entry for `key`. The schema, not the data, decides whether a field exists.
    pub fn schema_field(&self, key: &str) -> Result<&FieldSchemaEntry> {
        self.schema
            .get(key)
            .ok_or_else(|| MdTreeError::SchemaFieldNotFound {
                key: key.to_string(),
            })
    }

    /// Typed view of a schema field; an absent value yields the type default.
    pub fn field_value(&self, key: &str) -> Result<AnyFieldValue> {
        let entry = self.schema_field(key)?;
        match self.field(key) {
            Some(raw) => AnyFieldValue::from_raw(entry.field_type, key, raw),
            None => Ok(AnyFieldValue::empty(entry.field_type, key)),
        }
    }

    /// A copy with `key` set to `value`. Schema-declared fields must receive a
    /// value of their exact type.
    pub fn with_property(&self, key: &str, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        if let Some(entry) = self.schema.get(key) {
            if !entry.field_type.validate_value(&value) {
                return Err(MdTreeError::InvalidShape(format!(
                    "Field \"{key}\" expected {}, got {}",
                    entry.field_type,
                    type_name(&value)
                )));
            }
        }
        let mut data = self.data.clone();
        data.insert(Value::String(key.to_string()), value);
        Self::new(data, self.schema.clone())
    }

    /// A copy with `key` set from a typed field value.
    pub fn with_field_value(&self, field: &AnyFieldValue) -> Result<Self> {
        self.with_property(field.key(), field.to_value())
    }

    /// A copy without `key`; fails when the schema requires it.
    pub fn without_property(&self, key: &str) -> Result<Self> {
        let mut data = self.data.clone();
        data.shift_remove(key);
        Self::new(data, self.schema.clone())
    }

    /// The same data checked against a different schema.
    pub fn with_schema(&self, schema: Schema) -> Result<Self> {
        Self::new(self.data.clone(), schema)
    }

    /// One relation descriptor per relation-typed schema entry.
    pub fn relations(&self) -> Vec<RelationFieldValue> {
        self.schema
            .iter()
            .filter_map(|(key, entry)| RelationFieldValue::from_schema_entry(key, entry))
            .collect()
    }

    /// Type-check stored values against the schema.
    ///
    /// Runs independently of the required-field check done at construction.
    /// Wrong types and select values outside `options` are errors; keys the
    /// schema does not declare are warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (key, entry) in &self.schema {
            let Some(value) = self.data.get(key.as_str()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if !entry.field_type.validate_value(value) {
                result.errors.push(format!(
                    "Field \"{key}\" expected {}, got {}",
                    entry.field_type,
                    type_name(value)
                ));
                continue;
            }
            if let (true, Some(options)) = (entry.field_type.is_select(), &entry.options) {
                let chosen: Vec<&Value> = match value {
                    Value::Sequence(items) => items.iter().collect(),
                    scalar => vec![scalar],
                };
                for v in chosen {
                    if !options.contains(v) {
                        result.errors.push(format!(
                            "Field \"{key}\" value {} is not one of the allowed options",
                            render_scalar(v)
                        ));
                    }
                }
            }
        }

        for key in self.data.keys() {
            if let Some(key) = key.as_str() {
                if !self.schema.contains_key(key) {
                    result
                        .warnings
                        .push(format!("Field \"{key}\" is not declared in the schema"));
                }
            }
        }

        result
    }
}

fn check_required(data: &Mapping, schema: &Schema) -> Result<()> {
    for (key, entry) in schema {
        if !entry.required {
            continue;
        }
        let present = data.get(key.as_str()).map(|v| !v.is_null()).unwrap_or(false);
        if !present {
            return Err(MdTreeError::MissingRequiredField { key: key.clone() });
        }
    }
    Ok(())
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => type_name(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema_str, FieldType};
    use pretty_assertions::assert_eq;

    fn test_schema() -> Schema {
        parse_schema_str(
            r#"
title: { type: text, required: true }
views: { type: number }
draft: { type: boolean }
status: { type: select-text, options: [draft, published] }
tags: { type: multi-text }
authors: { type: multi-relation, path: ../authors }
"#,
        )
        .unwrap()
    }

    fn data(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_missing_required_field() {
        let schema: Schema = parse_schema_str("title: { type: text, required: true }").unwrap();
        let err = MetaValue::new(Mapping::new(), schema).unwrap_err();
        assert!(err.to_string().contains("Required field \"title\" is missing"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = MetaValue::new(data("title: null"), test_schema()).unwrap_err();
        assert!(matches!(err, MdTreeError::MissingRequiredField { ref key } if key == "title"));
    }

    #[test]
    fn test_field_and_has_key_ignore_schema() {
        let meta = MetaValue::new(data("title: Hello\nextra: 1"), test_schema()).unwrap();
        assert_eq!(meta.field("extra"), Some(&Value::from(1)));
        assert!(meta.has_key("extra"));
        assert!(!meta.has_key("views"));
    }

    #[test]
    fn test_schema_field_is_authoritative() {
        let meta = MetaValue::new(data("title: Hello\nextra: 1"), test_schema()).unwrap();
        assert_eq!(meta.schema_field("views").unwrap().field_type, FieldType::Number);
        let err = meta.schema_field("extra").unwrap_err();
        assert!(matches!(err, MdTreeError::SchemaFieldNotFound { ref key } if key == "extra"));
    }

    #[test]
    fn test_with_property_is_copy_on_write() {
        let original = MetaValue::new(data("title: Hello"), test_schema()).unwrap();
        let updated = original.with_property("views", 10).unwrap();

        assert_eq!(original.field("views"), None);
        assert_eq!(updated.field("views"), Some(&Value::from(10)));
        assert_eq!(updated.field("title"), original.field("title"));
    }

    #[test]
    fn test_with_property_idempotent() {
        let original = MetaValue::new(data("title: Hello"), test_schema()).unwrap();
        let once = original.with_property("draft", true).unwrap();
        let twice = once.with_property("draft", true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_with_property_rejects_wrong_type() {
        let meta = MetaValue::new(data("title: Hello"), test_schema()).unwrap();
        let err = meta.with_property("views", "ten").unwrap_err();
        assert!(err.to_string().contains("views"));
        // Undeclared keys are accepted as-is
        assert!(meta.with_property("extra", "anything").is_ok());
    }

    #[test]
    fn test_without_required_property_fails() {
        let meta = MetaValue::new(data("title: Hello\nviews: 3"), test_schema()).unwrap();
        assert!(meta.without_property("title").is_err());
        let trimmed = meta.without_property("views").unwrap();
        assert!(!trimmed.has_key("views"));
    }

    #[test]
    fn test_defaults_follow_schema_order() {
        let meta = MetaValue::defaults(parse_schema_str("a: { type: text }\nb: { type: multi-number }\nc: { type: boolean, default: true }").unwrap()).unwrap();
        let keys: Vec<&str> = meta.value().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(meta.field("b"), Some(&Value::Sequence(vec![])));
        assert_eq!(meta.field("c"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_field_value() {
        let meta = MetaValue::new(data("title: Hello\nviews: '12'"), test_schema()).unwrap();
        let views = meta.field_value("views").unwrap();
        assert_eq!(views.to_value(), Value::from(12));
        let draft = meta.field_value("draft").unwrap();
        assert_eq!(draft.to_value(), Value::Bool(false));
        assert!(meta.field_value("nope").is_err());
    }

    #[test]
    fn test_validate_reports_type_errors() {
        let meta = MetaValue::new(
            data("title: Hello\nviews: 'lots'\nstatus: archived\nunknown: 1"),
            test_schema(),
        )
        .unwrap();
        let result = meta.validate();
        assert!(!result.is_ok());
        assert!(result.errors.iter().any(|e| e.contains("views")));
        assert!(result.errors.iter().any(|e| e.contains("archived")));
        assert!(result.warnings.iter().any(|w| w.contains("unknown")));
    }

    #[test]
    fn test_validate_accepts_valid_data() {
        let meta = MetaValue::new(
            data("title: Hello\nviews: 3\nstatus: draft\ntags: [a, b]\nauthors: [jane]"),
            test_schema(),
        )
        .unwrap();
        let result = meta.validate();
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_relations() {
        let meta = MetaValue::defaults(test_schema()).unwrap();
        let relations = meta.relations();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].field_name(), "authors");
        assert_eq!(relations[0].file_path(), "../authors");
        assert!(relations[0].is_array());
    }

    #[test]
    fn test_from_value_rejects_scalars() {
        assert!(MetaValue::from_value(Value::from("nope"), Schema::new()).is_err());
        assert!(MetaValue::from_value(Value::Null, Schema::new()).unwrap().is_empty());
    }
}
