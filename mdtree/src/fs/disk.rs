use super::{storage_key, DirEntry, EntryKind, FileSystem, FileSystemReader, FileSystemWriter};
use crate::error::{MdTreeError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads files under a root directory on the local disk.
#[derive(Debug, Clone)]
pub struct DiskReader {
    root: PathBuf,
}

impl DiskReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskReader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a tree path.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let key = storage_key(path)?;
        if key == "." {
            return Ok(self.root.clone());
        }
        Ok(self.root.join(key))
    }

    async fn is_dir(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => tokio::fs::metadata(full)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn read_error(path: &str, e: std::io::Error) -> MdTreeError {
    if e.kind() == ErrorKind::NotFound {
        MdTreeError::not_found(path)
    } else {
        MdTreeError::Io(e)
    }
}

fn write_error(path: &str, e: std::io::Error) -> MdTreeError {
    if e.kind() == ErrorKind::NotFound {
        MdTreeError::not_found(path)
    } else {
        MdTreeError::write_failure(path, e.to_string())
    }
}

#[async_trait]
impl FileSystemReader for DiskReader {
    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => tokio::fs::metadata(full).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        if self.is_dir(path).await {
            return Err(MdTreeError::not_found(path));
        }
        tokio::fs::read_to_string(full)
            .await
            .map_err(|e| read_error(path, e))
    }

    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let full = self.resolve(path)?;
        if !self.is_dir(path).await {
            return Err(MdTreeError::not_found(path));
        }

        let mut reader = tokio::fs::read_dir(full)
            .await
            .map_err(|e| read_error(path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let kind = if entry.file_type().await?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry::new(path, name, kind));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Writes files under the same root as its reader, which it consults for
/// existence checks.
#[derive(Debug, Clone)]
pub struct DiskWriter {
    reader: Arc<DiskReader>,
}

impl DiskWriter {
    pub fn new(reader: Arc<DiskReader>) -> Self {
        DiskWriter { reader }
    }

    async fn ensure_parent(&self, path: &str, full: &Path) -> Result<()> {
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MdTreeError::write_failure(path, e.to_string()))?;
        }
        Ok(())
    }

    async fn require_file(&self, path: &str) -> Result<PathBuf> {
        let full = self.reader.resolve(path)?;
        if !self.reader.exists(path).await || self.reader.is_dir(path).await {
            return Err(MdTreeError::not_found(path));
        }
        Ok(full)
    }
}

#[async_trait]
impl FileSystemWriter for DiskWriter {
    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        log::debug!("disk: write {path}");
        let full = self.reader.resolve(path)?;
        self.ensure_parent(path, &full).await?;
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| MdTreeError::write_failure(path, e.to_string()))
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        log::debug!("disk: delete {path}");
        let full = self.reader.resolve(path)?;
        if self.reader.is_dir(path).await {
            return Err(MdTreeError::write_failure(path, "is a directory"));
        }
        tokio::fs::remove_file(full)
            .await
            .map_err(|e| write_error(path, e))
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        log::debug!("disk: create directory {path}");
        let full = self.reader.resolve(path)?;
        tokio::fs::create_dir_all(full)
            .await
            .map_err(|e| MdTreeError::write_failure(path, e.to_string()))
    }

    async fn create_empty_directory(&self, path: &str) -> Result<()> {
        log::debug!("disk: create empty directory {path}");
        if self.reader.exists(path).await {
            return Err(MdTreeError::write_failure(path, "already exists"));
        }
        self.create_directory(path).await
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("disk: copy {from} -> {to}");
        let source = self.require_file(from).await?;
        let target = self.reader.resolve(to)?;
        self.ensure_parent(to, &target).await?;
        tokio::fs::copy(source, target)
            .await
            .map(|_| ())
            .map_err(|e| MdTreeError::write_failure(to, e.to_string()))
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("disk: move {from} -> {to}");
        let source = self.require_file(from).await?;
        let target = self.reader.resolve(to)?;
        self.ensure_parent(to, &target).await?;
        tokio::fs::rename(source, target)
            .await
            .map_err(|e| MdTreeError::write_failure(to, e.to_string()))
    }
}

/// Disk-backed file system rooted at `root`.
pub fn file_system(root: impl Into<PathBuf>) -> FileSystem {
    let reader = Arc::new(DiskReader::new(root));
    let writer = Arc::new(DiskWriter::new(reader.clone()));
    FileSystem::new(reader, writer)
}
