use super::{storage_key, DirEntry, EntryKind, FileSystem, FileSystemReader, FileSystemWriter};
use crate::error::{MdTreeError, Result};
use crate::path::{PathSystem, PosixPathSystem};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MemoryTree {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        MemoryTree {
            files: BTreeMap::new(),
            dirs: BTreeSet::from([".".to_string()]),
        }
    }
}

impl MemoryTree {
    fn is_dir(&self, key: &str) -> bool {
        self.dirs.contains(key)
    }

    /// Register `key` as a directory along with every ancestor. Nothing is
    /// added when any of them is a file.
    fn add_dirs(&mut self, key: &str) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = key.to_string();
        while !self.dirs.contains(&current) {
            if self.files.contains_key(&current) {
                return Err(MdTreeError::write_failure(
                    key,
                    format!("{current} is a file"),
                ));
            }
            let parent = PosixPathSystem.dirname(&current);
            missing.push(current);
            current = parent;
        }
        self.dirs.extend(missing);
        Ok(())
    }

    fn write(&mut self, key: &str, content: &str) -> Result<()> {
        if self.is_dir(key) {
            return Err(MdTreeError::write_failure(key, "is a directory"));
        }
        self.add_dirs(&PosixPathSystem.dirname(key))?;
        self.files.insert(key.to_string(), content.to_string());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<String> {
        self.files
            .get(key)
            .cloned()
            .ok_or_else(|| MdTreeError::not_found(key))
    }

    fn children(&self, key: &str) -> Vec<(String, EntryKind)> {
        let parent_of = |path: &str| PosixPathSystem.dirname(path);
        let files = self
            .files
            .keys()
            .filter(|path| parent_of(path.as_str()) == key)
            .map(|path| (PosixPathSystem.basename(path, None), EntryKind::File));
        let dirs = self
            .dirs
            .iter()
            .filter(|path| path.as_str() != "." && parent_of(path.as_str()) == key)
            .map(|path| (PosixPathSystem.basename(path, None), EntryKind::Directory));
        files.chain(dirs).collect()
    }
}

/// In-memory backend. Clones share the same tree, so a test can keep one
/// handle for inspection while the tree under test writes through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    tree: Arc<Mutex<MemoryTree>>,
}

impl MemoryFileSystem {
    /// A tree seeded with `(path, content)` pairs; parent directories are implied.
    /// Seeds that cannot be stored (under a file, over a directory, above the
    /// root) are logged and skipped.
    pub fn new<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut tree = MemoryTree::default();
        for (path, content) in files {
            let path = path.as_ref();
            let content: String = content.into();
            if let Err(e) = storage_key(path).and_then(|key| tree.write(&key, &content)) {
                log::warn!("memory: dropping seed {path}: {e}");
            }
        }
        MemoryFileSystem {
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    /// Reader and writer over this same tree.
    pub fn file_system(&self) -> FileSystem {
        FileSystem::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    /// Every file currently stored, by path.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().files.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FileSystemReader for MemoryFileSystem {
    async fn exists(&self, path: &str) -> bool {
        let Ok(key) = storage_key(path) else {
            return false;
        };
        let tree = self.lock();
        tree.files.contains_key(&key) || tree.is_dir(&key)
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        self.lock().read(&storage_key(path)?)
    }

    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let key = storage_key(path)?;
        let children = {
            let tree = self.lock();
            if !tree.is_dir(&key) {
                return Err(MdTreeError::not_found(path));
            }
            tree.children(&key)
        };
        let mut entries: Vec<DirEntry> = children
            .into_iter()
            .map(|(name, kind)| DirEntry::new(path, name, kind))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[async_trait]
impl FileSystemWriter for MemoryFileSystem {
    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        log::debug!("memory: write {path}");
        self.lock().write(&storage_key(path)?, content)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        log::debug!("memory: delete {path}");
        let key = storage_key(path)?;
        let mut tree = self.lock();
        if tree.is_dir(&key) {
            return Err(MdTreeError::write_failure(path, "is a directory"));
        }
        tree.files
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| MdTreeError::not_found(path))
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        log::debug!("memory: create directory {path}");
        self.lock().add_dirs(&storage_key(path)?)
    }

    async fn create_empty_directory(&self, path: &str) -> Result<()> {
        log::debug!("memory: create empty directory {path}");
        let key = storage_key(path)?;
        let mut tree = self.lock();
        if tree.is_dir(&key) || tree.files.contains_key(&key) {
            return Err(MdTreeError::write_failure(path, "already exists"));
        }
        tree.add_dirs(&key)
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("memory: copy {from} -> {to}");
        let (from_key, to_key) = (storage_key(from)?, storage_key(to)?);
        let mut tree = self.lock();
        let content = tree.read(&from_key)?;
        tree.write(&to_key, &content)
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("memory: move {from} -> {to}");
        let (from_key, to_key) = (storage_key(from)?, storage_key(to)?);
        let mut tree = self.lock();
        let content = tree.read(&from_key)?;
        if from_key == to_key {
            return Ok(());
        }
        tree.write(&to_key, &content)?;
        tree.files.remove(&from_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let fs = MemoryFileSystem::default();
        fs.write_file("a/b.md", "x").await.unwrap();
        assert_eq!(fs.read_file("a/b.md").await.unwrap(), "x");
        assert!(fs.exists("a").await);
        assert!(fs.exists("/a/b.md").await);
    }

    #[tokio::test]
    async fn test_delete_then_read_is_not_found() {
        let fs = MemoryFileSystem::new([("a/b.md", "x")]);
        fs.delete_file("a/b.md").await.unwrap();
        let err = fs.read_file("a/b.md").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(fs.exists("a").await);
        assert!(fs.delete_file("a/b.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_read_directory_sorted() {
        let fs = MemoryFileSystem::new([
            ("docs/zeta.md", ""),
            ("docs/alpha.md", ""),
            ("docs/guides/intro.md", ""),
            ("readme.md", ""),
        ]);

        let root = fs.read_directory(".").await.unwrap();
        assert_eq!(names(&root), vec!["docs", "readme.md"]);
        assert_eq!(root[0].kind, EntryKind::Directory);

        let docs = fs.read_directory("docs").await.unwrap();
        assert_eq!(names(&docs), vec!["alpha.md", "guides", "zeta.md"]);
        assert_eq!(docs[1].path, "docs/guides");
    }

    #[tokio::test]
    async fn test_read_directory_missing() {
        let fs = MemoryFileSystem::new([("a.md", "")]);
        assert!(fs.read_directory("nope").await.unwrap_err().is_not_found());
        assert!(fs.read_directory("a.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_directory_is_idempotent() {
        let fs = MemoryFileSystem::default();
        fs.create_directory("a/b").await.unwrap();
        fs.create_directory("a/b").await.unwrap();
        assert!(fs.read_directory("a/b").await.unwrap().is_empty());
        assert_eq!(names(&fs.read_directory("a").await.unwrap()), vec!["b"]);
    }

    #[tokio::test]
    async fn test_create_empty_directory_rejects_existing() {
        let fs = MemoryFileSystem::default();
        fs.create_empty_directory("fresh").await.unwrap();
        let err = fs.create_empty_directory("fresh").await.unwrap_err();
        assert!(matches!(err, MdTreeError::WriteFailure { .. }));
    }

    #[tokio::test]
    async fn test_write_over_directory_fails() {
        let fs = MemoryFileSystem::new([("a/b.md", "x")]);
        assert!(fs.write_file("a", "oops").await.is_err());
        assert!(fs.write_file("a/b.md/c.md", "oops").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_directories() {
        let fs = MemoryFileSystem::new([("a.md", "x")]);
        assert!(fs.write_file("a.md/sub/c.md", "oops").await.is_err());
        assert!(fs.create_directory("a.md/sub").await.is_err());
        assert!(!fs.exists("a.md/sub").await);
        assert!(fs.read_directory("a.md/sub").await.unwrap_err().is_not_found());
        assert_eq!(names(&fs.read_directory(".").await.unwrap()), vec!["a.md"]);
    }

    #[tokio::test]
    async fn test_refuses_paths_above_root() {
        let fs = MemoryFileSystem::default();
        let err = fs.write_file("../outside.md", "x").await.unwrap_err();
        assert!(matches!(err, MdTreeError::InvalidShape(_)));
        assert!(!fs.exists("../outside.md").await);
        assert!(fs.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unstorable_seeds_are_skipped() {
        let fs = MemoryFileSystem::new([
            ("docs/a.md", "kept"),
            ("docs", "collides with a directory"),
            ("docs/a.md/b.md", "under a file"),
            ("../up.md", "above the root"),
        ]);
        assert_eq!(
            fs.snapshot(),
            BTreeMap::from([("docs/a.md".to_string(), "kept".to_string())])
        );
    }

    #[tokio::test]
    async fn test_copy_and_move() {
        let fs = MemoryFileSystem::new([("a.md", "x")]);
        fs.copy_file("a.md", "copies/a.md").await.unwrap();
        fs.move_file("a.md", "moved/b.md").await.unwrap();

        assert_eq!(
            fs.snapshot(),
            BTreeMap::from([
                ("copies/a.md".to_string(), "x".to_string()),
                ("moved/b.md".to_string(), "x".to_string()),
            ])
        );
        assert!(fs.copy_file("a.md", "c.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let fs = MemoryFileSystem::default();
        let handle = fs.file_system();
        handle.write_file("shared.md", "y").await.unwrap();
        assert_eq!(fs.snapshot().get("shared.md").map(String::as_str), Some("y"));
    }
}
