//! Path normalisation and working-copy location parsing

use std::path::{Path, PathBuf};

use url::Url;

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Converted to platform-native form only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: to_unix_path(&path.as_ref().to_string_lossy()),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Replace `\` with `/`.
///
/// Index path specs are always slash-separated, whatever the host platform.
pub fn to_unix_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Turn a configured working-copy location into a filesystem path.
///
/// Accepts plain paths as well as `file://` URLs.
pub fn location_to_path(location: &str) -> Result<PathBuf> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidLocation {
            location: location.to_string(),
            message: "location is empty".into(),
        });
    }

    if !trimmed.to_ascii_lowercase().starts_with("file:") {
        return Ok(PathBuf::from(trimmed));
    }

    let url = Url::parse(trimmed).map_err(|e| Error::InvalidLocation {
        location: location.to_string(),
        message: e.to_string(),
    })?;

    url.to_file_path().map_err(|_| Error::InvalidLocation {
        location: location.to_string(),
        message: "URL does not name a local file".into(),
    })
}
