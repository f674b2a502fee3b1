//! Error types for vcs-git

use std::path::PathBuf;

/// Result type for vcs-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required settings missing or contradictory. Not retried.
    Configuration,
    /// The remote or the shadow cache could not be reached.
    RemoteUnavailable,
    /// Local changes collide with incoming changes, or a push was rejected.
    Conflict,
    /// Local filesystem problem.
    Io,
    /// Any other version-control failure.
    Vcs,
}

/// Errors that can occur in vcs-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] vcs_fs::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Remote '{url}' unavailable: {source}")]
    RemoteUnavailable {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Working copy {path} already exists and is not empty")]
    WorkingCopyExists { path: PathBuf },

    #[error("Not a git working copy: {path}")]
    NotARepository { path: PathBuf },

    #[error("Revision '{name}' not found")]
    RevisionNotFound { name: String },

    #[error("{original}; rollback also failed, manual intervention required: {rollback}")]
    RollbackFailed {
        original: Box<Error>,
        rollback: Box<Error>,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn remote(url: impl Into<String>, source: git2::Error) -> Self {
        Self::RemoteUnavailable {
            url: url.into(),
            source,
        }
    }

    /// Classify this error into one of the [`ErrorKind`] buckets.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Git(e) => classify_git(e),
            Error::Fs(vcs_fs::Error::Io { .. }) => ErrorKind::Io,
            Error::Fs(_) | Error::Configuration { .. } => ErrorKind::Configuration,
            Error::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Io { .. } | Error::WorkingCopyExists { .. } | Error::NotARepository { .. } => {
                ErrorKind::Io
            }
            Error::RevisionNotFound { .. } => ErrorKind::Vcs,
            Error::RollbackFailed { original, .. } => original.kind(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Promote raw git2 failures that are really conflicts.
    pub(crate) fn reclassify(self) -> Self {
        match self {
            Error::Git(e) if classify_git(&e) == ErrorKind::Conflict => Error::Conflict {
                message: e.message().to_string(),
            },
            other => other,
        }
    }
}

fn classify_git(e: &git2::Error) -> ErrorKind {
    use git2::{ErrorClass, ErrorCode};

    match e.code() {
        ErrorCode::Conflict | ErrorCode::NotFastForward | ErrorCode::MergeConflict => {
            return ErrorKind::Conflict;
        }
        ErrorCode::Auth | ErrorCode::Certificate => return ErrorKind::RemoteUnavailable,
        _ => {}
    }

    match e.class() {
        ErrorClass::Net | ErrorClass::Ssh | ErrorClass::Http | ErrorClass::Ssl => {
            ErrorKind::RemoteUnavailable
        }
        ErrorClass::Os | ErrorClass::Filesystem => ErrorKind::Io,
        ErrorClass::Checkout | ErrorClass::Merge => ErrorKind::Conflict,
        _ => ErrorKind::Vcs,
    }
}
