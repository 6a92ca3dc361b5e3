use crate::error::{MdTreeError, Result};
use crate::field::value::type_name;
use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";

/// Split a document into its front-matter mapping and body.
///
/// Front matter is a `---` line, a YAML block, and a closing `---` line at the
/// very start of the text. Without an opening delimiter, or when the block is
/// never closed, the whole text is body and the mapping is empty.
pub fn split_front_matter(text: &str) -> Result<(Mapping, &str)> {
    let open_len = if text.starts_with("---\n") {
        4
    } else if text.starts_with("---\r\n") {
        5
    } else {
        return Ok((Mapping::new(), text));
    };

    let after_open = &text[open_len..];
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(|c: char| c == '\r' || c == '\n') == DELIMITER {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((parse_block(yaml)?, body));
        }
        offset += line.len();
    }

    Ok((Mapping::new(), text))
}

fn parse_block(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        other => Err(MdTreeError::InvalidShape(format!(
            "Front matter must be a mapping, got {}",
            type_name(&other)
        ))),
    }
}

/// Render a front-matter block, or nothing for an empty mapping.
///
/// Sequences come out as block sequences, scalars as `key: value`.
pub fn render_front_matter(data: &Mapping) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }
    let yaml = serde_yaml::to_string(data)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
}
