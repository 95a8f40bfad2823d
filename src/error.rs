use thiserror::Error;

pub type Result<T> = std::result::Result<T, SshSyncError>;

#[derive(Debug, Error)]
pub enum SshSyncError {
    #[error("Storage error [{code}]: {message}")]
    Storage { code: String, message: String },

    #[error("Remote config document is malformed: {0}")]
    RemoteDocument(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Home directory could not be determined")]
    NoHomeDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SshSyncError {
    /// Build a storage failure from a provider error code
    pub fn storage(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, if this is a storage failure
    pub fn storage_code(&self) -> Option<&str> {
        match self {
            Self::Storage { code, .. } => Some(code),
            _ => None,
        }
    }
}
