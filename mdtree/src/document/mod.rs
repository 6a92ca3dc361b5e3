// Document I/O - markdown with YAML front matter

pub mod content;
pub mod frontmatter;
pub mod markdown;

pub use content::{ContentValue, MARKDOWN_CONTENT_TYPE};
pub use frontmatter::{render_front_matter, split_front_matter};
