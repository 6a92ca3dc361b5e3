// Field values - the typed view over one front-matter property.

pub mod value;

pub use value::{
    BooleanValue, MultiNumberValue, MultiRelationValue, MultiSelectNumberValue,
    MultiSelectTextValue, MultiTextValue, NumberValue, RelationValue, SelectNumberValue,
    SelectTextValue, TextValue,
};

use crate::error::{MdTreeError, Result};
use crate::schema::FieldType;
use serde_yaml::Value;

/// A field value of any variant.
///
/// This is the factory for field values: `empty` and `from_raw` are the two
/// dispatch tables from [`FieldType`] to the concrete value type. Adding a
/// variant means a new `FieldType` case, a new type in [`value`], and one arm
/// in each table.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyFieldValue {
    Text(TextValue),
    Number(NumberValue),
    Boolean(BooleanValue),
    SelectText(SelectTextValue),
    SelectNumber(SelectNumberValue),
    Relation(RelationValue),
    MultiText(MultiTextValue),
    MultiNumber(MultiNumberValue),
    MultiSelectText(MultiSelectTextValue),
    MultiSelectNumber(MultiSelectNumberValue),
    MultiRelation(MultiRelationValue),
}

macro_rules! each_variant {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            AnyFieldValue::Text($v) => $body,
            AnyFieldValue::Number($v) => $body,
            AnyFieldValue::Boolean($v) => $body,
            AnyFieldValue::SelectText($v) => $body,
            AnyFieldValue::SelectNumber($v) => $body,
            AnyFieldValue::Relation($v) => $body,
            AnyFieldValue::MultiText($v) => $body,
            AnyFieldValue::MultiNumber($v) => $body,
            AnyFieldValue::MultiSelectText($v) => $body,
            AnyFieldValue::MultiSelectNumber($v) => $body,
            AnyFieldValue::MultiRelation($v) => $body,
        }
    };
}

impl AnyFieldValue {
    pub fn empty(field_type: FieldType, key: impl Into<String>) -> Self {
        let key = key.into();
        match field_type {
            FieldType::Text => AnyFieldValue::Text(TextValue::empty(key)),
            FieldType::Number => AnyFieldValue::Number(NumberValue::empty(key)),
            FieldType::Boolean => AnyFieldValue::Boolean(BooleanValue::empty(key)),
            FieldType::SelectText => AnyFieldValue::SelectText(SelectTextValue::empty(key)),
            FieldType::SelectNumber => AnyFieldValue::SelectNumber(SelectNumberValue::empty(key)),
            FieldType::Relation => AnyFieldValue::Relation(RelationValue::empty(key)),
            FieldType::MultiText => AnyFieldValue::MultiText(MultiTextValue::empty(key)),
            FieldType::MultiNumber => AnyFieldValue::MultiNumber(MultiNumberValue::empty(key)),
            FieldType::MultiSelectText => {
                AnyFieldValue::MultiSelectText(MultiSelectTextValue::empty(key))
            }
            FieldType::MultiSelectNumber => {
                AnyFieldValue::MultiSelectNumber(MultiSelectNumberValue::empty(key))
            }
            FieldType::MultiRelation => {
                AnyFieldValue::MultiRelation(MultiRelationValue::empty(key))
            }
        }
    }

    pub fn from_raw(field_type: FieldType, key: impl Into<String>, raw: &Value) -> Result<Self> {
        let key = key.into();
        Ok(match field_type {
            FieldType::Text => AnyFieldValue::Text(TextValue::from_raw(key, raw)?),
            FieldType::Number => AnyFieldValue::Number(NumberValue::from_raw(key, raw)?),
            FieldType::Boolean => AnyFieldValue::Boolean(BooleanValue::from_raw(key, raw)?),
            FieldType::SelectText => {
                AnyFieldValue::SelectText(SelectTextValue::from_raw(key, raw)?)
            }
            FieldType::SelectNumber => {
                AnyFieldValue::SelectNumber(SelectNumberValue::from_raw(key, raw)?)
            }
            FieldType::Relation => AnyFieldValue::Relation(RelationValue::from_raw(key, raw)?),
            FieldType::MultiText => AnyFieldValue::MultiText(MultiTextValue::from_raw(key, raw)?),
            FieldType::MultiNumber => {
                AnyFieldValue::MultiNumber(MultiNumberValue::from_raw(key, raw)?)
            }
            FieldType::MultiSelectText => {
                AnyFieldValue::MultiSelectText(MultiSelectTextValue::from_raw(key, raw)?)
            }
            FieldType::MultiSelectNumber => {
                AnyFieldValue::MultiSelectNumber(MultiSelectNumberValue::from_raw(key, raw)?)
            }
            FieldType::MultiRelation => {
                AnyFieldValue::MultiRelation(MultiRelationValue::from_raw(key, raw)?)
            }
        })
    }

    /// Empty value for a raw tag; an unrecognized tag is an `UnknownFieldType`.
    pub fn empty_for_tag(tag: &str, key: impl Into<String>) -> Result<Self> {
        Ok(Self::empty(dispatch_tag(tag)?, key))
    }

    /// Build from a raw `{type, value}` record.
    pub fn from_record(key: impl Into<String>, record: &Value) -> Result<Self> {
        let key = key.into();
        let tag = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MdTreeError::InvalidShape(format!(
                    "Field \"{key}\" record has no string \"type\""
                ))
            })?;
        let field_type = dispatch_tag(tag)?;
        let raw = record.get("value").unwrap_or(&Value::Null);
        Self::from_raw(field_type, key, raw)
    }

    pub fn key(&self) -> &str {
        each_variant!(self, v => v.key())
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            AnyFieldValue::Text(_) => TextValue::FIELD_TYPE,
            AnyFieldValue::Number(_) => NumberValue::FIELD_TYPE,
            AnyFieldValue::Boolean(_) => BooleanValue::FIELD_TYPE,
            AnyFieldValue::SelectText(_) => SelectTextValue::FIELD_TYPE,
            AnyFieldValue::SelectNumber(_) => SelectNumberValue::FIELD_TYPE,
            AnyFieldValue::Relation(_) => RelationValue::FIELD_TYPE,
            AnyFieldValue::MultiText(_) => MultiTextValue::FIELD_TYPE,
            AnyFieldValue::MultiNumber(_) => MultiNumberValue::FIELD_TYPE,
            AnyFieldValue::MultiSelectText(_) => MultiSelectTextValue::FIELD_TYPE,
            AnyFieldValue::MultiSelectNumber(_) => MultiSelectNumberValue::FIELD_TYPE,
            AnyFieldValue::MultiRelation(_) => MultiRelationValue::FIELD_TYPE,
        }
    }

    pub fn to_value(&self) -> Value {
        each_variant!(self, v => v.to_value())
    }

    /// Same key and variant, new raw value.
    pub fn with_value(&self, raw: &Value) -> Result<Self> {
        Self::from_raw(self.field_type(), self.key(), raw)
    }
}

fn dispatch_tag(tag: &str) -> Result<FieldType> {
    FieldType::from_tag(tag).map_err(|_| MdTreeError::UnknownFieldType {
        tag: tag.to_string(),
    })
}
