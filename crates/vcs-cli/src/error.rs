//! Error types for vcs-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from vcs-git
    #[error(transparent)]
    Git(#[from] vcs_git::Error),

    /// Error from vcs-fs
    #[error(transparent)]
    Fs(#[from] vcs_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code; conflicts get their own so scripts can retry clean.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Git(e) if e.is_conflict() => 2,
            _ => 1,
        }
    }
}
