// Remote backend - the tree lives behind a small REST service:
//
//   HEAD   /entries/<path>              200 if present, 404 if not
//   GET    /files/<path>                file text
//   PUT    /files/<path>                body is the new file text
//   DELETE /files/<path>
//   GET    /directories/<path>          [{"name": .., "kind": "file"|"directory"}]
//   PUT    /directories/<path>          ?exclusive=true answers 409 if present
//   POST   /copy, /move                 {"from": .., "to": ..}

use super::{storage_key, DirEntry, EntryKind, FileSystem, FileSystemReader, FileSystemWriter};
use crate::error::{MdTreeError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    name: String,
    kind: EntryKind,
}

#[derive(Debug, Serialize)]
struct Transfer<'a> {
    from: &'a str,
    to: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteFileSystem {
    client: Client,
    base_url: Url,
}

impl RemoteFileSystem {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    /// Every request fails with `Http` once `timeout` elapses.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MdTreeError::InvalidShape(format!("Invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MdTreeError::InvalidShape(format!(
                "Base URL cannot carry paths: {base_url}"
            )));
        }
        Ok(RemoteFileSystem { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn file_system(&self) -> FileSystem {
        let shared = Arc::new(self.clone());
        FileSystem::new(shared.clone(), shared)
    }

    /// `<base>/<resource>/<path segments>`, each segment percent-encoded.
    fn url(&self, resource: &str, path: &str) -> Result<Url> {
        let key = storage_key(path)?;
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource);
            segments.extend(key.split('/').filter(|s| *s != "."));
        }
        Ok(url)
    }

    async fn transfer(&self, resource: &str, from: &str, to: &str) -> Result<()> {
        let (from, to) = (storage_key(from)?, storage_key(to)?);
        let response = self
            .client
            .post(self.url(resource, ".")?)
            .json(&Transfer {
                from: &from,
                to: &to,
            })
            .send()
            .await?;
        check(&from, response).map(|_| ())
    }
}

/// 404 is `NotFound`; any other non-success status is a `WriteFailure`.
fn check(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(MdTreeError::not_found(path));
    }
    if !status.is_success() {
        return Err(MdTreeError::write_failure(
            path,
            format!("remote answered {status}"),
        ));
    }
    Ok(response)
}

#[async_trait]
impl FileSystemReader for RemoteFileSystem {
    async fn exists(&self, path: &str) -> bool {
        let Ok(url) = self.url("entries", path) else {
            return false;
        };
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::warn!("remote: exists check for {path} failed: {e}");
                false
            }
        }
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let response = self.client.get(self.url("files", path)?).send().await?;
        Ok(check(path, response)?.text().await?)
    }

    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let response = self
            .client
            .get(self.url("directories", path)?)
            .send()
            .await?;
        let listing: Vec<RemoteEntry> = check(path, response)?.json().await?;
        let mut entries: Vec<DirEntry> = listing
            .into_iter()
            .map(|entry| DirEntry::new(path, entry.name, entry.kind))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[async_trait]
impl FileSystemWriter for RemoteFileSystem {
    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        log::debug!("remote: write {path}");
        let response = self
            .client
            .put(self.url("files", path)?)
            .body(content.to_string())
            .send()
            .await?;
        check(path, response).map(|_| ())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        log::debug!("remote: delete {path}");
        let response = self.client.delete(self.url("files", path)?).send().await?;
        check(path, response).map(|_| ())
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        log::debug!("remote: create directory {path}");
        let response = self
            .client
            .put(self.url("directories", path)?)
            .send()
            .await?;
        check(path, response).map(|_| ())
    }

    async fn create_empty_directory(&self, path: &str) -> Result<()> {
        log::debug!("remote: create empty directory {path}");
        let response = self
            .client
            .put(self.url("directories", path)?)
            .query(&[("exclusive", "true")])
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(MdTreeError::write_failure(path, "already exists"));
        }
        check(path, response).map(|_| ())
    }

    async fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("remote: copy {from} -> {to}");
        self.transfer("copy", from, to).await
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        log::debug!("remote: move {from} -> {to}");
        self.transfer("move", from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_building() {
        let remote = RemoteFileSystem::new("http://localhost:9000/api/").unwrap();
        assert_eq!(
            remote.url("files", "docs/a b.md").unwrap().as_str(),
            "http://localhost:9000/api/files/docs/a%20b.md"
        );
        assert_eq!(
            remote.url("directories", ".").unwrap().as_str(),
            "http://localhost:9000/api/directories"
        );
        assert_eq!(
            remote.url("entries", "/docs//x.md").unwrap().as_str(),
            "http://localhost:9000/api/entries/docs/x.md"
        );
    }

    #[test]
    fn test_refuses_paths_above_root() {
        let remote = RemoteFileSystem::new("http://localhost:9000/api/").unwrap();
        let err = remote.url("files", "docs/../../secret.md").unwrap_err();
        assert!(matches!(err, MdTreeError::InvalidShape(_)));
        assert_eq!(
            remote.url("files", "docs/../notes.md").unwrap().as_str(),
            "http://localhost:9000/api/files/notes.md"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(RemoteFileSystem::new("mailto:someone@example.com").is_err());
        assert!(RemoteFileSystem::new("::nope").is_err());
    }
}
