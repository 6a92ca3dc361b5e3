use super::frontmatter::{render_front_matter, split_front_matter};
use super::markdown::{replace_description, replace_title, Outline};
use crate::error::Result;
use crate::meta::MetaValue;
use crate::schema::Schema;
use serde_yaml::{Mapping, Value};

pub const MARKDOWN_CONTENT_TYPE: &str = "markdown-content";

/// A markdown document: body text, its derived title and description, and
/// the front matter that goes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentValue {
    body: String,
    title: String,
    description: String,
    meta: MetaValue,
}

impl ContentValue {
    pub fn new(
        body: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        meta: MetaValue,
    ) -> Self {
        ContentValue {
            body: body.into(),
            title: title.into(),
            description: description.into(),
            meta,
        }
    }

    /// Derive title and description from a markdown body (no front matter).
    /// The body is kept verbatim; meta starts at the schema defaults.
    pub fn from_markdown(text: &str, schema: Schema) -> Result<Self> {
        let meta = MetaValue::defaults(schema)?;
        Ok(Self::derived(text.to_string(), meta))
    }

    /// Parse a full document: front matter layered over the defaults of the
    /// optional schema fields, then the remaining body as in
    /// [`from_markdown`](Self::from_markdown). Required fields get no default,
    /// so a document that leaves one out fails with `MissingRequiredField`.
    pub fn parse(document: &str, schema: Schema) -> Result<Self> {
        let (front_matter, body) = split_front_matter(document)?;
        let mut data: Mapping = schema
            .iter()
            .filter(|(_, entry)| !entry.required)
            .map(|(key, entry)| (Value::String(key.clone()), entry.effective_default()))
            .collect();
        for (key, value) in front_matter {
            data.insert(key, value);
        }
        let meta = MetaValue::new(data, schema)?;
        Ok(Self::derived(body.to_string(), meta))
    }

    fn derived(body: String, meta: MetaValue) -> Self {
        let outline = Outline::parse(&body);
        ContentValue {
            title: outline.title_text(),
            description: outline.description_text(),
            body,
            meta,
        }
    }

    pub fn content_type(&self) -> &'static str {
        MARKDOWN_CONTENT_TYPE
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn meta(&self) -> &MetaValue {
        &self.meta
    }

    /// New title, written into the body's leading heading.
    pub fn with_title(&self, title: &str) -> Self {
        let body = replace_title(&self.body, title);
        ContentValue {
            body,
            title: title.to_string(),
            description: self.description.clone(),
            meta: self.meta.clone(),
        }
    }

    /// New description, written into the body's first paragraph.
    pub fn with_description(&self, description: &str) -> Self {
        let body = replace_description(&self.body, description);
        ContentValue {
            body,
            title: self.title.clone(),
            description: description.to_string(),
            meta: self.meta.clone(),
        }
    }

    /// New body; title and description are derived from it again.
    pub fn with_content(&self, body: &str) -> Self {
        Self::derived(body.to_string(), self.meta.clone())
    }

    pub fn with_meta(&self, meta: MetaValue) -> Self {
        ContentValue {
            body: self.body.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            meta,
        }
    }

    /// Front-matter block (omitted when meta is empty) followed by the body.
    pub fn to_text(&self) -> Result<String> {
        let mut text = render_front_matter(self.meta.value())?;
        text.push_str(&self.body);
        Ok(text)
    }
}
