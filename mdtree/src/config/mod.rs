use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tree-wide settings, usually read from a YAML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Icon for directories whose meta file does not name one.
    pub default_icon: String,
    /// Extension (with the dot) of files treated as markdown documents.
    pub markdown_extension: String,
    pub backend: BackendConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            default_icon: "folder".to_string(),
            markdown_extension: ".md".to_string(),
            backend: BackendConfig::default(),
        }
    }
}

/// Which file system backend to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Disk {
        root: PathBuf,
    },
    Memory,
    Remote {
        base_url: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Disk {
            root: PathBuf::from("."),
        }
    }
}

impl TreeConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a config YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(TreeConfig::default());
        }
        let config: TreeConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::from_yaml_str("").unwrap();
        assert_eq!(config, TreeConfig::default());
        assert_eq!(config.markdown_extension, ".md");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = TreeConfig::from_yaml_str("default_icon: archive").unwrap();
        assert_eq!(config.default_icon, "archive");
        assert_eq!(config.markdown_extension, ".md");
    }

    #[test]
    fn test_remote_backend() {
        let config = TreeConfig::from_yaml_str(
            "backend:\n  kind: remote\n  base_url: http://localhost:9000/api\n  timeout_secs: 5\n",
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Remote {
                base_url: "http://localhost:9000/api".into(),
                timeout_secs: Some(5),
            }
        );
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mdtree.yaml");
        std::fs::write(&path, "backend:\n  kind: disk\n  root: content\n").unwrap();

        let config = TreeConfig::load(&path).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Disk {
                root: PathBuf::from("content")
            }
        );
    }

    #[test]
    fn test_unknown_backend_kind() {
        assert!(TreeConfig::from_yaml_str("backend:\n  kind: ftp\n").is_err());
    }
}
