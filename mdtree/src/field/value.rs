// Concrete field values, one per FieldType variant.
// Each wraps a front-matter key and a raw value already coerced to the
// variant's runtime shape; transformations return new instances.

use crate::error::{MdTreeError, Result};
use crate::schema::FieldType;
use serde_yaml::{Number, Value};

macro_rules! field_value {
    (
        $(#[$doc:meta])*
        $name:ident, $field_type:expr, $raw:ty, $default:expr, $coerce:expr, $to_value:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            key: String,
            value: $raw,
        }

        impl $name {
            pub const FIELD_TYPE: FieldType = $field_type;

            /// A value holding the type default.
            pub fn empty(key: impl Into<String>) -> Self {
                $name {
                    key: key.into(),
                    value: $default,
                }
            }

            /// Extract a value from raw front-matter data, coercing where unambiguous.
            pub fn from_raw(key: impl Into<String>, raw: &Value) -> Result<Self> {
                let key = key.into();
                let coerce: fn(&str, &Value) -> Result<$raw> = $coerce;
                let value = coerce(&key, raw)?;
                Ok($name { key, value })
            }

            pub fn new(key: impl Into<String>, value: $raw) -> Self {
                $name {
                    key: key.into(),
                    value,
                }
            }

            pub fn key(&self) -> &str {
                &self.key
            }

            pub fn value(&self) -> &$raw {
                &self.value
            }

            pub fn with_value(&self, value: $raw) -> Self {
                $name {
                    key: self.key.clone(),
                    value,
                }
            }

            pub fn to_value(&self) -> Value {
                let convert: fn(&$raw) -> Value = $to_value;
                convert(&self.value)
            }
        }
    };
}

field_value!(
    TextValue, FieldType::Text, String, String::new(), coerce_text, text_to_value
);
field_value!(
    NumberValue, FieldType::Number, Number, Number::from(0), coerce_number, number_to_value
);
field_value!(
    BooleanValue, FieldType::Boolean, bool, false, coerce_bool, |b| Value::Bool(*b)
);
field_value!(
    /// One value out of the schema's `options`.
    SelectTextValue, FieldType::SelectText, String, String::new(), coerce_text, text_to_value
);
field_value!(
    SelectNumberValue, FieldType::SelectNumber, Number, Number::from(0), coerce_number, number_to_value
);
field_value!(
    /// Key of one document in the relation's target directory.
    RelationValue, FieldType::Relation, String, String::new(), coerce_text, text_to_value
);
field_value!(
    MultiTextValue, FieldType::MultiText, Vec<String>, Vec::new(),
    |key, raw| coerce_list(key, raw, coerce_text),
    |items| list_to_value(items, text_to_value)
);
field_value!(
    MultiNumberValue, FieldType::MultiNumber, Vec<Number>, Vec::new(),
    |key, raw| coerce_list(key, raw, coerce_number),
    |items| list_to_value(items, number_to_value)
);
field_value!(
    MultiSelectTextValue, FieldType::MultiSelectText, Vec<String>, Vec::new(),
    |key, raw| coerce_list(key, raw, coerce_text),
    |items| list_to_value(items, text_to_value)
);
field_value!(
    MultiSelectNumberValue, FieldType::MultiSelectNumber, Vec<Number>, Vec::new(),
    |key, raw| coerce_list(key, raw, coerce_number),
    |items| list_to_value(items, number_to_value)
);
field_value!(
    /// Keys of documents in the relation's target directory.
    MultiRelationValue, FieldType::MultiRelation, Vec<String>, Vec::new(),
    |key, raw| coerce_list(key, raw, coerce_text),
    |items| list_to_value(items, text_to_value)
);

// ── Coercion ───────────────────────────────────────────────────

fn coerce_text(key: &str, raw: &Value) -> Result<String> {
    match raw {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(shape_error(key, "text", other)),
    }
}

fn coerce_number(key: &str, raw: &Value) -> Result<Number> {
    match raw {
        Value::Null => Ok(Number::from(0)),
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Number::from(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Number::from(f)),
                _ => Err(shape_error(key, "number", raw)),
            }
        }
        other => Err(shape_error(key, "number", other)),
    }
}

fn coerce_bool(key: &str, raw: &Value) -> Result<bool> {
    match raw {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(shape_error(key, "boolean", other)),
    }
}

fn coerce_list<T>(
    key: &str,
    raw: &Value,
    item: fn(&str, &Value) -> Result<T>,
) -> Result<Vec<T>> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(|v| item(key, v)).collect(),
        scalar => Ok(vec![item(key, scalar)?]),
    }
}

fn text_to_value(s: &String) -> Value {
    Value::String(s.clone())
}

fn number_to_value(n: &Number) -> Value {
    Value::Number(n.clone())
}

fn list_to_value<T>(items: &[T], item: fn(&T) -> Value) -> Value {
    Value::Sequence(items.iter().map(item).collect())
}

fn shape_error(key: &str, expected: &str, got: &Value) -> MdTreeError {
    MdTreeError::InvalidShape(format!(
        "Field \"{key}\" expected {expected}, got {}",
        type_name(got)
    ))
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "object",
        Value::Tagged(_) => "tagged",
    }
}
