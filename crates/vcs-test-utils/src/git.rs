//! Bare remote repositories with scripted history.
//!
//! Built entirely with `git2`; no system `git` is required.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Name of the branch every fixture starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// A bare repository standing in for the true remote.
///
/// Starts with one commit on `main` containing `README.md`. Commits made
/// through the fixture play the part of other users pushing to the remote.
pub struct RemoteFixture {
    repo: Repository,
    temp_dir: TempDir,
}

impl Default for RemoteFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFixture {
    /// Create the remote at `<tmp>/remote.git`.
    ///
    /// # Panics
    /// Panics if the repository cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new()
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to create temp dir: {e}"));
        let mut options = RepositoryInitOptions::new();
        options.bare(true).initial_head(DEFAULT_BRANCH);
        let repo = Repository::init_opts(temp_dir.path().join("remote.git"), &options)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to init bare repository: {e}"));

        let fixture = Self { repo, temp_dir };
        fixture.commit_file("README.md", "# Test", "Initial commit");
        fixture
    }

    /// Directory holding the remote and anything else a test creates.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Location to hand to the engine as the remote URL.
    pub fn url(&self) -> String {
        self.repo.path().to_string_lossy().trim_end_matches('/').to_string()
    }

    /// A not-yet-existing working copy location next to the remote.
    pub fn working_copy(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Commit `name` with `content` on `main`.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        self.commit_file_on(DEFAULT_BRANCH, name, content, message)
    }

    /// Commit `name` with `content` on `branch`, creating the branch from
    /// `main` if it does not exist.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn commit_file_on(&self, branch: &str, name: &str, content: &str, message: &str) -> Oid {
        let refname = format!("refs/heads/{branch}");
        let parent = self
            .repo
            .refname_to_id(&refname)
            .or_else(|_| {
                self.repo
                    .refname_to_id(&format!("refs/heads/{DEFAULT_BRANCH}"))
            })
            .ok()
            .map(|oid| self.repo.find_commit(oid).unwrap_or_else(|e| panic!("{e}")));

        let parent_tree = parent.as_ref().map(|c| c.tree().unwrap_or_else(|e| panic!("{e}")));
        let mut builder = self
            .repo
            .treebuilder(parent_tree.as_ref())
            .unwrap_or_else(|e| panic!("commit_file_on: treebuilder failed: {e}"));
        let blob = self
            .repo
            .blob(content.as_bytes())
            .unwrap_or_else(|e| panic!("commit_file_on: blob failed: {e}"));
        builder
            .insert(name, blob, 0o100644)
            .unwrap_or_else(|e| panic!("commit_file_on: insert failed: {e}"));
        let tree_id = builder
            .write()
            .unwrap_or_else(|e| panic!("commit_file_on: tree write failed: {e}"));
        let tree = self
            .repo
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("commit_file_on: {e}"));

        let sig = Signature::now("Remote User", "remote@example.com")
            .unwrap_or_else(|e| panic!("commit_file_on: {e}"));
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("commit_file_on: commit failed: {e}"))
    }

    /// Tip of `main`.
    pub fn head(&self) -> Oid {
        self.tip(DEFAULT_BRANCH)
    }

    /// Tip of `branch`.
    ///
    /// # Panics
    /// Panics if the branch does not exist.
    pub fn tip(&self, branch: &str) -> Oid {
        self.repo
            .refname_to_id(&format!("refs/heads/{branch}"))
            .unwrap_or_else(|e| panic!("RemoteFixture: no branch {branch}: {e}"))
    }

    /// Lightweight tag `name` at `target`.
    pub fn tag(&self, name: &str, target: Oid) {
        let object = self
            .repo
            .find_object(target, None)
            .unwrap_or_else(|e| panic!("tag: {e}"));
        self.repo
            .tag_lightweight(name, &object, false)
            .unwrap_or_else(|e| panic!("tag: failed to create {name}: {e}"));
    }

    /// Branch `name` at `target`.
    pub fn branch(&self, name: &str, target: Oid) {
        let commit = self
            .repo
            .find_commit(target)
            .unwrap_or_else(|e| panic!("branch: {e}"));
        self.repo
            .branch(name, &commit, false)
            .unwrap_or_else(|e| panic!("branch: failed to create {name}: {e}"));
    }

    /// Content of `name` at the tip of `branch`, if present.
    pub fn file_at(&self, branch: &str, name: &str) -> Option<String> {
        let commit = self.repo.find_commit(self.tip(branch)).ok()?;
        let entry = commit.tree().ok()?.get_name(name)?.to_object(&self.repo).ok()?;
        let blob = entry.as_blob()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Message of the commit at the tip of `branch`.
    pub fn message_at(&self, branch: &str) -> String {
        let commit = self
            .repo
            .find_commit(self.tip(branch))
            .unwrap_or_else(|e| panic!("message_at: {e}"));
        commit.message().unwrap_or("").to_string()
    }
}
