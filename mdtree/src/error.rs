use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdTreeError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid field type: \"{tag}\"")]
    InvalidFieldType { tag: String },

    #[error("Required field \"{key}\" is missing")]
    MissingRequiredField { key: String },

    #[error("Field \"{key}\" is not declared in the schema")]
    SchemaFieldNotFound { key: String },

    #[error("Unknown field type: \"{tag}\"")]
    UnknownFieldType { tag: String },

    #[error("Write failed for {path}: {message}")]
    WriteFailure { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MdTreeError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        MdTreeError::NotFound { path: path.into() }
    }

    pub(crate) fn write_failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        MdTreeError::WriteFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the requested path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MdTreeError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MdTreeError>;
