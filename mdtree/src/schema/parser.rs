use super::types::Schema;
use crate::error::Result;

/// Parse a field schema declaration written as YAML.
pub fn parse_schema_str(content: &str) -> Result<Schema> {
    if content.trim().is_empty() {
        return Ok(Schema::new());
    }
    let schema: Schema = serde_yaml::from_str(content)?;
    Ok(schema)
}

/// Parse a field schema declaration written as JSON.
pub fn parse_schema_json(content: &str) -> Result<Schema> {
    let schema: Schema = serde_json::from_str(content)?;
    Ok(schema)
}
