// File system abstraction - async reader/writer traits the document tree is
// stored behind, with disk, in-memory and remote backends.

pub mod disk;
pub mod memory;
pub mod remote;

use crate::config::{BackendConfig, TreeConfig};
use crate::directory::META_FILE_NAME;
use crate::error::{MdTreeError, Result};
use crate::path::{PathSystem, PosixPathSystem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use disk::{DiskReader, DiskWriter};
pub use memory::MemoryFileSystem;
pub use remote::RemoteFileSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    /// The listed directory joined with `name`.
    pub path: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(directory: &str, name: impl Into<String>, kind: EntryKind) -> Self {
        let name = name.into();
        DirEntry {
            path: PosixPathSystem.join(&[directory, &name]),
            name,
            kind,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Read side of a backend. Paths are `/`-separated and relative to the
/// backend's root; a leading `/` is ignored.
#[async_trait]
pub trait FileSystemReader: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    /// Full text of a file. `NotFound` when absent.
    async fn read_file(&self, path: &str) -> Result<String>;

    /// Immediate children, sorted by name. `NotFound` unless `path` is a directory.
    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Parsed `.meta.json` of a directory, or `None` when it has none.
    async fn read_directory_meta(&self, path: &str) -> Result<Option<serde_json::Value>> {
        let meta_path = PosixPathSystem.join(&[path, META_FILE_NAME]);
        match self.read_file(&meta_path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Write side of a backend. Writes create missing parent directories.
#[async_trait]
pub trait FileSystemWriter: Send + Sync {
    /// Create or replace a file.
    async fn write_file(&self, path: &str, content: &str) -> Result<()>;

    async fn delete_file(&self, path: &str) -> Result<()>;

    /// Create a directory and its ancestors. Succeeds if it already exists.
    async fn create_directory(&self, path: &str) -> Result<()>;

    /// Create a directory that must not exist yet.
    async fn create_empty_directory(&self, path: &str) -> Result<()>;

    async fn copy_file(&self, from: &str, to: &str) -> Result<()>;

    async fn move_file(&self, from: &str, to: &str) -> Result<()>;
}

/// A reader/writer pair. Cheap to clone.
#[derive(Clone)]
pub struct FileSystem {
    reader: Arc<dyn FileSystemReader>,
    writer: Arc<dyn FileSystemWriter>,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem").finish_non_exhaustive()
    }
}

impl FileSystem {
    pub fn new(reader: Arc<dyn FileSystemReader>, writer: Arc<dyn FileSystemWriter>) -> Self {
        FileSystem { reader, writer }
    }

    /// A file system whose every write fails.
    pub fn read_only(reader: Arc<dyn FileSystemReader>) -> Self {
        Self::new(reader, Arc::new(ReadOnlyWriter))
    }

    pub fn reader(&self) -> &dyn FileSystemReader {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> &dyn FileSystemWriter {
        self.writer.as_ref()
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.reader.exists(path).await
    }

    pub async fn read_file(&self, path: &str) -> Result<String> {
        self.reader.read_file(path).await
    }

    pub async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.reader.read_directory(path).await
    }

    pub async fn read_directory_meta(&self, path: &str) -> Result<Option<serde_json::Value>> {
        self.reader.read_directory_meta(path).await
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        self.writer.write_file(path, content).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.writer.delete_file(path).await
    }

    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.writer.create_directory(path).await
    }

    pub async fn create_empty_directory(&self, path: &str) -> Result<()> {
        self.writer.create_empty_directory(path).await
    }

    pub async fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        self.writer.copy_file(from, to).await
    }

    pub async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        self.writer.move_file(from, to).await
    }
}

struct ReadOnlyWriter;

impl ReadOnlyWriter {
    fn refuse(path: &str) -> Result<()> {
        Err(MdTreeError::write_failure(path, "file system is read-only"))
    }
}

#[async_trait]
impl FileSystemWriter for ReadOnlyWriter {
    async fn write_file(&self, path: &str, _content: &str) -> Result<()> {
        Self::refuse(path)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        Self::refuse(path)
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        Self::refuse(path)
    }

    async fn create_empty_directory(&self, path: &str) -> Result<()> {
        Self::refuse(path)
    }

    async fn copy_file(&self, _from: &str, to: &str) -> Result<()> {
        Self::refuse(to)
    }

    async fn move_file(&self, from: &str, _to: &str) -> Result<()> {
        Self::refuse(from)
    }
}

/// Build the backend named by the config.
pub fn open(config: &TreeConfig) -> Result<FileSystem> {
    match &config.backend {
        BackendConfig::Disk { root } => Ok(disk::file_system(root)),
        BackendConfig::Memory => Ok(MemoryFileSystem::default().file_system()),
        BackendConfig::Remote {
            base_url,
            timeout_secs,
        } => {
            let remote = match timeout_secs {
                Some(secs) => RemoteFileSystem::with_timeout(base_url, Duration::from_secs(*secs))?,
                None => RemoteFileSystem::new(base_url)?,
            };
            Ok(remote.file_system())
        }
    }
}

/// Backend-internal form of a path: no leading `/`, normalized, `"."` for the
/// root. Paths that climb above the root are refused on every backend.
pub(crate) fn storage_key(path: &str) -> Result<String> {
    let key = PosixPathSystem.normalize(path.trim_start_matches('/'));
    if key == ".." || key.starts_with("../") {
        return Err(MdTreeError::InvalidShape(format!(
            "Path escapes the tree root: {path}"
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("/docs//a.md").unwrap(), "docs/a.md");
        assert_eq!(storage_key("./docs/../a.md").unwrap(), "a.md");
        assert_eq!(storage_key("").unwrap(), ".");
        assert_eq!(storage_key("/").unwrap(), ".");
    }

    #[test]
    fn test_storage_key_refuses_escape() {
        for path in ["..", "../x.md", "docs/../../x.md", "/../authors"] {
            let err = storage_key(path).unwrap_err();
            assert!(matches!(err, MdTreeError::InvalidShape(_)), "{path}");
        }
    }

    #[test]
    fn test_dir_entry_path() {
        let entry = DirEntry::new(".", "a.md", EntryKind::File);
        assert_eq!(entry.path, "a.md");
        let entry = DirEntry::new("docs", "guides", EntryKind::Directory);
        assert_eq!(entry.path, "docs/guides");
        assert!(entry.is_directory());
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let memory = MemoryFileSystem::new([("a.md", "x")]);
        let fs = FileSystem::read_only(Arc::new(memory));

        assert_eq!(fs.read_file("a.md").await.unwrap(), "x");
        let err = fs.write_file("a.md", "y").await.unwrap_err();
        assert!(matches!(err, MdTreeError::WriteFailure { .. }));
        assert!(fs.delete_file("a.md").await.is_err());
        assert_eq!(fs.read_file("a.md").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_read_directory_meta() {
        let fs = MemoryFileSystem::new([("docs/.meta.json", r#"{"icon": "book"}"#)]).file_system();
        let meta = fs.read_directory_meta("docs").await.unwrap().unwrap();
        assert_eq!(meta["icon"], "book");
        assert_eq!(fs.read_directory_meta(".").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = TreeConfig {
            backend: BackendConfig::Memory,
            ..TreeConfig::default()
        };
        let fs = open(&config).unwrap();
        fs.write_file("notes/a.md", "hello").await.unwrap();
        assert!(fs.exists("notes").await);
    }

    #[test]
    fn test_open_remote_rejects_bad_url() {
        let config = TreeConfig {
            backend: BackendConfig::Remote {
                base_url: "not a url".into(),
                timeout_secs: None,
            },
            ..TreeConfig::default()
        };
        assert!(open(&config).is_err());
    }
}
