//! On-disk synchronization state of a working copy.

use std::path::{Path, PathBuf};

use git2::Repository;
use vcs_fs::io;

use crate::shadow::ShadowRepositoryCache;
use crate::{Error, Result};

/// What the engine finds at a working copy location, re-derived from disk on
/// every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing there, or an empty directory. Ready for a fresh checkout.
    Absent,
    /// A working copy with no shadow cache beside it.
    Unmanaged,
    /// A working copy with its shadow cache.
    CheckedOut,
    /// Occupied by something that is not a working copy.
    Blocked,
}

impl SyncState {
    pub fn detect(working_copy: &Path) -> Result<Self> {
        if !working_copy.exists() || io::is_empty_dir(working_copy)? {
            return Ok(Self::Absent);
        }

        match Repository::open(working_copy) {
            Ok(repo) if !repo.is_bare() => {}
            _ => return Ok(Self::Blocked),
        }

        if ShadowRepositoryCache::is_present(working_copy)? {
            Ok(Self::CheckedOut)
        } else {
            Ok(Self::Unmanaged)
        }
    }

    /// Whether a working copy exists at the location.
    pub fn has_working_copy(self) -> bool {
        matches!(self, Self::Unmanaged | Self::CheckedOut)
    }
}

/// Absolute form of a working copy path, so remotes recorded in it stay valid
/// regardless of the current directory.
pub(crate) fn absolute(working_copy: &Path) -> Result<PathBuf> {
    std::path::absolute(working_copy).map_err(|e| Error::Io {
        path: working_copy.to_path_buf(),
        message: e.to_string(),
    })
}

/// Open the working copy at `working_copy`.
pub(crate) fn open_working_copy(working_copy: &Path) -> Result<Repository> {
    let not_a_repository = || Error::NotARepository {
        path: working_copy.to_path_buf(),
    };
    let repo = Repository::open(working_copy).map_err(|_| not_a_repository())?;
    if repo.is_bare() {
        return Err(not_a_repository());
    }
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_and_empty_paths_are_absent() {
        let temp = TempDir::new().unwrap();
        assert_eq!(SyncState::detect(temp.path()).unwrap(), SyncState::Absent);
        assert_eq!(
            SyncState::detect(&temp.path().join("nope")).unwrap(),
            SyncState::Absent
        );
    }

    #[test]
    fn plain_directory_is_blocked() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file.txt"), "x").unwrap();
        assert_eq!(SyncState::detect(temp.path()).unwrap(), SyncState::Blocked);
    }

    #[test]
    fn bare_repository_is_blocked() {
        let temp = TempDir::new().unwrap();
        Repository::init_bare(temp.path()).unwrap();
        assert_eq!(SyncState::detect(temp.path()).unwrap(), SyncState::Blocked);
        assert!(open_working_copy(temp.path()).is_err());
    }

    #[test]
    fn repository_without_cache_is_unmanaged() {
        let temp = TempDir::new().unwrap();
        let wc = temp.path().join("wc");
        Repository::init(&wc).unwrap();
        let state = SyncState::detect(&wc).unwrap();
        assert_eq!(state, SyncState::Unmanaged);
        assert!(state.has_working_copy());

        Repository::init_bare(ShadowRepositoryCache::path_for(&wc).unwrap()).unwrap();
        assert_eq!(SyncState::detect(&wc).unwrap(), SyncState::CheckedOut);
    }
}
