pub mod parser;
pub mod types;

pub use parser::{parse_schema_json, parse_schema_str};
pub use types::{FieldSchemaEntry, FieldType, Schema};
