pub mod path;
pub mod schema;
pub mod field;
pub mod meta;
pub mod relation;
pub mod directory;
pub mod document;
pub mod fs;
pub mod reference;
pub mod config;
pub mod error;

pub use config::{BackendConfig, TreeConfig};
pub use directory::DirectoryMetaValue;
pub use document::ContentValue;
pub use error::{MdTreeError, Result};
pub use field::AnyFieldValue;
pub use fs::{DirEntry, EntryKind, FileSystem, FileSystemReader, FileSystemWriter};
pub use meta::{MetaValue, ValidationResult};
pub use path::{MockPathSystem, PathSystem, PosixPathSystem};
pub use reference::{
    DirectoryReference, Entity, FileKind, FileReference, MarkdownEntity, Reference, Tree,
};
pub use relation::RelationFieldValue;
pub use schema::{FieldSchemaEntry, FieldType, Schema};
