//! Assertions over a working copy on disk.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;

/// A working copy location with helpers for test setup and assertion.
pub struct TestWorkspace {
    path: PathBuf,
}

impl TestWorkspace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the working copy.
    ///
    /// # Panics
    /// Panics if it is not a repository.
    pub fn repo(&self) -> Repository {
        Repository::open(&self.path)
            .unwrap_or_else(|e| panic!("{} is not a repository: {e}", self.path.display()))
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("write: {e}"));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write: failed to write {}: {e}", path.display()));
    }

    pub fn read(&self, name: &str) -> String {
        let path = self.path.join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("read: failed to read {}: {e}", path.display()))
    }

    pub fn head(&self) -> String {
        self.repo()
            .head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.id().to_string())
            .unwrap_or_else(|e| panic!("head: {e}"))
    }

    /// Current branch, `None` when detached.
    pub fn branch(&self) -> Option<String> {
        let repo = self.repo();
        let head = repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(String::from)
        } else {
            None
        }
    }

    /// Whether the working copy has uncommitted changes to tracked files.
    pub fn is_dirty(&self) -> bool {
        let repo = self.repo();
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false);
        let statuses = repo
            .statuses(Some(&mut options))
            .unwrap_or_else(|e| panic!("is_dirty: {e}"));
        !statuses.is_empty()
    }

    /// Whether `name` is staged in the index.
    pub fn is_staged(&self, name: &str) -> bool {
        let repo = self.repo();
        let index = repo.index().unwrap_or_else(|e| panic!("is_staged: {e}"));
        index.get_path(Path::new(name), 0).is_some()
    }

    /// URL of the working copy's `origin`.
    pub fn origin_url(&self) -> String {
        let repo = self.repo();
        let remote = repo
            .find_remote("origin")
            .unwrap_or_else(|e| panic!("origin_url: {e}"));
        remote.url().unwrap_or("").to_string()
    }

    pub fn assert_file(&self, name: &str, expected: &str) {
        assert_eq!(self.read(name), expected, "content of {name}");
    }
}
