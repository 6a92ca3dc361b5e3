// Reference layer - navigate a document tree: directory -> file -> entity.
// Nothing is cached; every call goes back to the file system.

use crate::config::TreeConfig;
use crate::directory::{DirectoryMetaValue, META_FILE_NAME};
use crate::document::ContentValue;
use crate::error::{MdTreeError, Result};
use crate::fs::{self, FileSystem};
use crate::path::{PathSystem, PosixPathSystem};
use crate::relation::RelationFieldValue;
use crate::schema::Schema;
use std::sync::Arc;

/// A document tree: a file system plus the settings used to interpret it.
#[derive(Debug, Clone)]
pub struct Tree {
    fs: FileSystem,
    config: Arc<TreeConfig>,
}

impl Tree {
    pub fn new(fs: FileSystem, config: TreeConfig) -> Self {
        Tree {
            fs,
            config: Arc::new(config),
        }
    }

    /// Build the configured backend and wrap it.
    pub fn open(config: TreeConfig) -> Result<Self> {
        let fs = fs::open(&config)?;
        Ok(Self::new(fs, config))
    }

    pub fn file_system(&self) -> &FileSystem {
        &self.fs
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> DirectoryReference {
        self.directory(".")
    }

    pub fn directory(&self, path: &str) -> DirectoryReference {
        DirectoryReference {
            tree: self.clone(),
            path: PosixPathSystem.normalize(path),
        }
    }

    pub fn file(&self, path: &str) -> FileReference {
        FileReference {
            tree: self.clone(),
            path: PosixPathSystem.normalize(path),
        }
    }

    fn kind_of(&self, path: &str) -> FileKind {
        if PosixPathSystem.basename(path, None) == META_FILE_NAME {
            FileKind::DirectoryMeta
        } else if PosixPathSystem.extname(path) == self.config.markdown_extension {
            FileKind::Markdown
        } else {
            FileKind::Unknown
        }
    }

    /// File name for a document key: the key itself when it already carries
    /// an extension, otherwise the key plus the markdown extension.
    fn document_file_name(&self, key: &str) -> String {
        if PosixPathSystem.extname(key).is_empty() {
            format!("{key}{}", self.config.markdown_extension)
        } else {
            key.to_string()
        }
    }
}

/// A child found while listing a directory.
#[derive(Debug, Clone)]
pub enum Reference {
    Directory(DirectoryReference),
    File(FileReference),
}

impl Reference {
    pub fn path(&self) -> &str {
        match self {
            Reference::Directory(dir) => dir.path(),
            Reference::File(file) => file.path(),
        }
    }

    pub fn name(&self) -> String {
        PosixPathSystem.basename(self.path(), None)
    }

    pub fn as_file(&self) -> Option<&FileReference> {
        match self {
            Reference::File(file) => Some(file),
            Reference::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryReference> {
        match self {
            Reference::Directory(dir) => Some(dir),
            Reference::File(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryReference {
    tree: Tree,
    path: String,
}

impl DirectoryReference {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> String {
        PosixPathSystem.basename(&self.path, None)
    }

    pub fn is_root(&self) -> bool {
        self.path == "." || self.path == "/"
    }

    /// The enclosing directory; `None` at the tree root.
    pub fn parent(&self) -> Option<DirectoryReference> {
        if self.is_root() {
            return None;
        }
        Some(self.tree.directory(&PosixPathSystem.dirname(&self.path)))
    }

    pub fn file(&self, name: &str) -> FileReference {
        self.tree.file(&PosixPathSystem.join(&[&self.path, name]))
    }

    pub fn directory(&self, name: &str) -> DirectoryReference {
        self.tree.directory(&PosixPathSystem.join(&[&self.path, name]))
    }

    /// The file a document key names inside this directory.
    pub fn document(&self, key: &str) -> FileReference {
        self.file(&self.tree.document_file_name(key))
    }

    pub async fn exists(&self) -> bool {
        self.tree.fs.exists(&self.path).await
    }

    /// Create this directory (and its ancestors) if missing.
    pub async fn create(&self) -> Result<()> {
        self.tree.fs.create_directory(&self.path).await
    }

    /// Directory meta, or the defaults when there is no `.meta.json`.
    pub async fn meta(&self) -> Result<DirectoryMetaValue> {
        let icon = &self.tree.config.default_icon;
        match self.tree.fs.read_directory_meta(&self.path).await? {
            Some(value) => DirectoryMetaValue::from_value(value, icon),
            None => Ok(DirectoryMetaValue::empty(icon)),
        }
    }

    pub async fn save_meta(&self, meta: &DirectoryMetaValue) -> Result<()> {
        let path = PosixPathSystem.join(&[&self.path, META_FILE_NAME]);
        self.tree.fs.write_file(&path, &meta.to_json()?).await
    }

    /// Children sorted by name. The meta sidecar is not listed; see [`meta`](Self::meta).
    pub async fn list(&self) -> Result<Vec<Reference>> {
        let entries = self.tree.fs.read_directory(&self.path).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.name != META_FILE_NAME)
            .map(|entry| {
                if entry.is_directory() {
                    Reference::Directory(self.tree.directory(&entry.path))
                } else {
                    Reference::File(self.tree.file(&entry.path))
                }
            })
            .collect())
    }

    /// Markdown files in this directory.
    pub async fn document_files(&self) -> Result<Vec<FileReference>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter_map(|child| match child {
                Reference::File(file) if file.kind() == FileKind::Markdown => Some(file),
                _ => None,
            })
            .collect())
    }

    /// Every markdown document in this directory. Documents that fail to
    /// load are logged and left out.
    pub async fn documents(&self) -> Result<Vec<MarkdownEntity>> {
        let schema = self.meta().await?.schema().clone();
        let mut documents = Vec::new();
        for file in self.document_files().await? {
            match file.load_markdown(&schema).await {
                Ok(entity) => documents.push(entity),
                Err(e) => log::warn!("Failed to read document {}: {}", file.path(), e),
            }
        }
        Ok(documents)
    }

    /// Fresh content for a new document here: a title heading, meta at the
    /// directory schema's defaults.
    pub async fn draft(&self, title: &str) -> Result<ContentValue> {
        let schema = self.meta().await?.schema().clone();
        ContentValue::from_markdown(&format!("# {title}\n"), schema)
    }

    /// Write a new document under `key`. Fails if the file already exists.
    pub async fn create_document(
        &self,
        key: &str,
        content: &ContentValue,
    ) -> Result<MarkdownEntity> {
        let reference = self.document(key);
        if reference.exists().await {
            return Err(MdTreeError::write_failure(reference.path(), "already exists"));
        }
        reference.write(content).await?;
        Ok(MarkdownEntity {
            reference,
            content: content.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Markdown,
    DirectoryMeta,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct FileReference {
    tree: Tree,
    path: String,
}

impl FileReference {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> String {
        PosixPathSystem.basename(&self.path, None)
    }

    /// Document key: the file name without the markdown extension.
    pub fn key(&self) -> String {
        let extension = self.tree.config.markdown_extension.as_str();
        PosixPathSystem.basename(&self.path, Some(extension))
    }

    pub fn kind(&self) -> FileKind {
        self.tree.kind_of(&self.path)
    }

    pub fn directory(&self) -> DirectoryReference {
        self.tree.directory(&PosixPathSystem.dirname(&self.path))
    }

    pub async fn exists(&self) -> bool {
        self.tree.fs.exists(&self.path).await
    }

    pub async fn read_text(&self) -> Result<String> {
        self.tree.fs.read_file(&self.path).await
    }

    /// Load the file as the entity its kind calls for.
    pub async fn read(&self) -> Result<Entity> {
        match self.kind() {
            FileKind::Markdown => Ok(Entity::Markdown(self.read_markdown().await?)),
            FileKind::DirectoryMeta => {
                let text = self.read_text().await?;
                let meta = DirectoryMetaValue::from_json(&text, &self.tree.config.default_icon)?;
                Ok(Entity::DirectoryMeta {
                    reference: self.clone(),
                    meta,
                })
            }
            FileKind::Unknown => {
                if !self.exists().await {
                    return Err(MdTreeError::not_found(&self.path));
                }
                Ok(Entity::Unknown(self.clone()))
            }
        }
    }

    /// Parse as a markdown document against its directory's schema.
    pub async fn read_markdown(&self) -> Result<MarkdownEntity> {
        if self.kind() != FileKind::Markdown {
            return Err(MdTreeError::InvalidShape(format!(
                "{} is not a markdown document",
                self.path
            )));
        }
        let schema = self.directory().meta().await?.schema().clone();
        self.load_markdown(&schema).await
    }

    async fn load_markdown(&self, schema: &Schema) -> Result<MarkdownEntity> {
        let text = self.read_text().await?;
        let content = ContentValue::parse(&text, schema.clone())?;
        Ok(MarkdownEntity {
            reference: self.clone(),
            content,
        })
    }

    pub async fn write(&self, content: &ContentValue) -> Result<()> {
        self.write_text(&content.to_text()?).await
    }

    pub async fn write_text(&self, text: &str) -> Result<()> {
        self.tree.fs.write_file(&self.path, text).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.tree.fs.delete_file(&self.path).await
    }

    /// Copy to `destination` (a tree path) and return a reference to the copy.
    pub async fn copy_to(&self, destination: &str) -> Result<FileReference> {
        let target = self.tree.file(destination);
        self.tree.fs.copy_file(&self.path, target.path()).await?;
        Ok(target)
    }

    /// Move to `destination`; the returned reference replaces this one.
    pub async fn move_to(&self, destination: &str) -> Result<FileReference> {
        let target = self.tree.file(destination);
        self.tree.fs.move_file(&self.path, target.path()).await?;
        Ok(target)
    }
}

/// A loaded file.
#[derive(Debug, Clone)]
pub enum Entity {
    Markdown(MarkdownEntity),
    DirectoryMeta {
        reference: FileReference,
        meta: DirectoryMetaValue,
    },
    Unknown(FileReference),
}

impl Entity {
    pub fn reference(&self) -> &FileReference {
        match self {
            Entity::Markdown(doc) => &doc.reference,
            Entity::DirectoryMeta { reference, .. } => reference,
            Entity::Unknown(reference) => reference,
        }
    }

    pub fn as_markdown(&self) -> Option<&MarkdownEntity> {
        match self {
            Entity::Markdown(doc) => Some(doc),
            _ => None,
        }
    }
}

/// A markdown document together with the file it came from.
#[derive(Debug, Clone)]
pub struct MarkdownEntity {
    reference: FileReference,
    content: ContentValue,
}

impl MarkdownEntity {
    pub fn reference(&self) -> &FileReference {
        &self.reference
    }

    pub fn content(&self) -> &ContentValue {
        &self.content
    }

    pub fn key(&self) -> String {
        self.reference.key()
    }

    /// Same file, new content. Nothing is written until [`save`](Self::save).
    pub fn with_content(&self, content: ContentValue) -> Self {
        MarkdownEntity {
            reference: self.reference.clone(),
            content,
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.reference.write(&self.content).await
    }

    pub fn relations(&self) -> Vec<RelationFieldValue> {
        self.content.meta().relations()
    }

    /// The relation declared for `field`.
    pub fn relation(&self, field: &str) -> Result<RelationFieldValue> {
        let entry = self.content.meta().schema_field(field)?;
        RelationFieldValue::from_schema_entry(field, entry).ok_or_else(|| {
            MdTreeError::InvalidShape(format!(
                "Field \"{field}\" is {}, not a relation",
                entry.field_type
            ))
        })
    }

    /// Directory a relation points into, relative to this document's directory
    /// unless the relation path is absolute.
    pub fn target_directory(&self, relation: &RelationFieldValue) -> DirectoryReference {
        let base = self.reference.directory();
        self.reference
            .tree
            .directory(&relation.full_path(base.path()))
    }

    /// Files this document's relation currently points at.
    pub fn related_files(&self, relation: &RelationFieldValue) -> Result<Vec<FileReference>> {
        let target = self.target_directory(relation);
        Ok(relation
            .keys(self.content.meta())?
            .iter()
            .map(|key| target.document(key))
            .collect())
    }

    /// Load the documents a relation points at, in field order.
    pub async fn resolve(&self, relation: &RelationFieldValue) -> Result<Vec<MarkdownEntity>> {
        let files = self.related_files(relation)?;
        let Some(first) = files.first() else {
            return Ok(Vec::new());
        };
        let schema = first.directory().meta().await?.schema().clone();
        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            documents.push(file.load_markdown(&schema).await?);
        }
        Ok(documents)
    }

    /// Documents a relation could point at: every markdown file in its target directory.
    pub async fn relation_candidates(
        &self,
        relation: &RelationFieldValue,
    ) -> Result<Vec<FileReference>> {
        self.target_directory(relation).document_files().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    const POSTS_META: &str = r#"{
        "icon": "pen",
        "schema": {
            "title": {"type": "text", "required": true},
            "author": {"type": "relation", "path": "../authors"},
            "tags": {"type": "multi-relation", "path": "/tags"}
        }
    }"#;

    fn fixture() -> (MemoryFileSystem, Tree) {
        let memory = MemoryFileSystem::new([
            ("posts/.meta.json", POSTS_META),
            (
                "posts/hello.md",
                "---\ntitle: Hello\nauthor: alice\ntags:\n- rust\n- yaml\n---\n# Hello\n\nFirst post.\n",
            ),
            ("posts/broken.md", "---\n- not\n- a mapping\n---\n"),
            ("posts/cover.png", "binary"),
            ("authors/alice.md", "# Alice\n\nWrites things.\n"),
            ("authors/bob.md", "# Bob\n"),
            ("tags/rust.md", "# Rust\n"),
            ("tags/yaml.md", "# YAML\n"),
        ]);
        let tree = Tree::new(memory.file_system(), TreeConfig::default());
        (memory, tree)
    }

    async fn hello(tree: &Tree) -> MarkdownEntity {
        tree.file("posts/hello.md").read_markdown().await.unwrap()
    }

    #[tokio::test]
    async fn test_list_root() {
        let (_memory, tree) = fixture();
        let children = tree.root().list().await.unwrap();
        let names: Vec<String> = children.iter().map(Reference::name).collect();
        assert_eq!(names, vec!["authors", "posts", "tags"]);
        assert!(children.iter().all(|c| c.as_directory().is_some()));
    }

    #[tokio::test]
    async fn test_list_hides_meta_file() {
        let (_memory, tree) = fixture();
        let children = tree.directory("posts").list().await.unwrap();
        let names: Vec<String> = children.iter().map(Reference::name).collect();
        assert_eq!(names, vec!["broken.md", "cover.png", "hello.md"]);
    }

    #[tokio::test]
    async fn test_directory_meta() {
        let (_memory, tree) = fixture();
        let posts = tree.directory("posts").meta().await.unwrap();
        assert_eq!(posts.icon(), "pen");
        assert_eq!(posts.relations().len(), 2);

        let authors = tree.directory("authors").meta().await.unwrap();
        assert_eq!(authors.icon(), "folder");
        assert!(authors.schema().is_empty());
    }

    #[tokio::test]
    async fn test_read_markdown() {
        let (_memory, tree) = fixture();
        let doc = hello(&tree).await;
        assert_eq!(doc.key(), "hello");
        assert_eq!(doc.content().title(), "Hello");
        assert_eq!(doc.content().description(), "First post.");
        assert_eq!(doc.content().meta().field("author"), Some(&Value::from("alice")));
    }

    #[tokio::test]
    async fn test_read_by_kind() {
        let (_memory, tree) = fixture();
        let meta = tree.file("posts/.meta.json").read().await.unwrap();
        assert!(matches!(meta, Entity::DirectoryMeta { .. }));

        let image = tree.file("posts/cover.png").read().await.unwrap();
        assert!(matches!(image, Entity::Unknown(_)));
        assert_eq!(image.reference().name(), "cover.png");

        let missing = tree.file("posts/missing.png").read().await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_documents_skip_unreadable() {
        let (_memory, tree) = fixture();
        let docs = tree.directory("posts").documents().await.unwrap();
        let keys: Vec<String> = docs.iter().map(MarkdownEntity::key).collect();
        assert_eq!(keys, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_resolve_single_relation() {
        let (_memory, tree) = fixture();
        let doc = hello(&tree).await;
        let author = doc.relation("author").unwrap();
        assert_eq!(doc.target_directory(&author).path(), "authors");

        let resolved = doc.resolve(&author).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].content().title(), "Alice");
        assert_eq!(resolved[0].reference().path(), "authors/alice.md");
    }

    #[tokio::test]
    async fn test_resolve_absolute_multi_relation() {
        let (_memory, tree) = fixture();
        let doc = hello(&tree).await;
        let tags = doc.relation("tags").unwrap();
        let titles: Vec<String> = doc
            .resolve(&tags)
            .await
            .unwrap()
            .iter()
            .map(|d| d.content().title().to_string())
            .collect();
        assert_eq!(titles, vec!["Rust", "YAML"]);
    }

    #[tokio::test]
    async fn test_resolve_dangling_relation() {
        let (_memory, tree) = fixture();
        let doc = hello(&tree).await;
        let meta = doc.content().meta().with_property("author", "carol").unwrap();
        let doc = doc.with_content(doc.content().with_meta(meta));
        let author = doc.relation("author").unwrap();
        assert!(doc.resolve(&author).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_relation_candidates() {
        let (_memory, tree) = fixture();
        let doc = hello(&tree).await;
        let author = doc.relation("author").unwrap();
        let candidates: Vec<String> = doc
            .relation_candidates(&author)
            .await
            .unwrap()
            .iter()
            .map(FileReference::key)
            .collect();
        assert_eq!(candidates, vec!["alice", "bob"]);
        assert!(doc.relation("title").is_err());
    }

    #[tokio::test]
    async fn test_save_writes_back() {
        let (memory, tree) = fixture();
        let doc = hello(&tree).await;
        let updated = doc.with_content(doc.content().with_title("Hello again"));
        updated.save().await.unwrap();

        let stored = memory.snapshot()["posts/hello.md"].clone();
        assert!(stored.contains("# Hello again\n"));
        assert!(stored.contains("author: alice"));
        assert_eq!(hello(&tree).await.content().title(), "Hello again");
    }

    #[tokio::test]
    async fn test_create_document() {
        let (memory, tree) = fixture();
        let posts = tree.directory("posts");
        let draft = posts.draft("Second").await.unwrap();
        let draft = draft.with_meta(draft.meta().with_property("title", "Second").unwrap());

        let created = posts.create_document("second", &draft).await.unwrap();
        assert_eq!(created.reference().path(), "posts/second.md");
        assert!(memory.snapshot().contains_key("posts/second.md"));

        let err = posts.create_document("second", &draft).await.unwrap_err();
        assert!(matches!(err, MdTreeError::WriteFailure { .. }));
    }

    #[tokio::test]
    async fn test_copy_move_delete() {
        let (_memory, tree) = fixture();
        let bob = tree.file("authors/bob.md");
        let copy = bob.copy_to("archive/bob.md").await.unwrap();
        assert!(copy.exists().await);

        let moved = copy.move_to("archive/robert.md").await.unwrap();
        assert_eq!(moved.key(), "robert");
        assert!(!copy.exists().await);

        moved.delete().await.unwrap();
        assert!(!moved.exists().await);
        assert!(bob.exists().await);
    }

    #[tokio::test]
    async fn test_parent_navigation() {
        let (_memory, tree) = fixture();
        assert!(tree.root().parent().is_none());
        let guides = tree.directory("posts").directory("guides");
        assert_eq!(guides.path(), "posts/guides");
        assert_eq!(guides.parent().unwrap().path(), "posts");
        assert!(guides.parent().unwrap().parent().unwrap().is_root());
    }

    #[tokio::test]
    async fn test_save_meta() {
        let (_memory, tree) = fixture();
        let authors = tree.directory("authors");
        let meta = authors.meta().await.unwrap().with_icon("person");
        authors.save_meta(&meta).await.unwrap();
        assert_eq!(authors.meta().await.unwrap().icon(), "person");
    }
}
