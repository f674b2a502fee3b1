//! The version-control surface the bootstrap layer drives.

use std::path::Path;

use crate::Result;
use crate::history::RevisionHistoryEntry;

/// Operations for keeping a working copy in sync with a remote repository.
///
/// Every operation re-derives the working copy's state from disk; nothing is
/// cached between calls.
pub trait VersionControl {
    /// Human-readable name of the backing implementation.
    fn implementation_name(&self) -> &'static str;

    /// Check that `remote_url` is reachable with the configured credentials.
    ///
    /// Returns the revision the remote's `HEAD` advertises, if any.
    fn test_connection(&self, remote_url: &str) -> Result<Option<String>>;

    /// Create a working copy of `remote_url` at `working_copy`.
    ///
    /// A `?branch=<name>` suffix on the URL selects the branch to check out.
    /// Fails if `working_copy` already exists and is not an empty directory.
    fn checkout(&self, remote_url: &str, working_copy: &Path) -> Result<String>;

    /// Like [`checkout`](Self::checkout), then check out `revision`.
    fn checkout_revision(
        &self,
        remote_url: &str,
        working_copy: &Path,
        revision: &str,
    ) -> Result<String>;

    /// Pull remote changes into the current branch.
    fn update(&self, working_copy: &Path) -> Result<String>;

    /// Pull remote changes and check out `revision`.
    fn update_revision(&self, working_copy: &Path, revision: &str) -> Result<String>;

    /// Commit all modified tracked files and publish the commit.
    fn commit(&self, working_copy: &Path, message: &str) -> Result<String>;

    /// Stage `files`, commit and publish.
    ///
    /// Returns `None` without doing anything when `files` is empty.
    fn add_and_commit(
        &self,
        working_copy: &Path,
        message: &str,
        files: &[&str],
    ) -> Result<Option<String>>;

    /// Stage every change in the working copy without committing.
    fn recursive_add(&self, working_copy: &Path) -> Result<()>;

    /// Revision `HEAD` points at.
    fn local_revision(&self, working_copy: &Path) -> Result<String>;

    /// Newest remote revision the local branch does not have yet, or the local
    /// revision when there is none.
    fn remote_revision(&self, working_copy: &Path) -> Result<String>;

    /// Up to `limit` entries, newest first: remote commits not yet pulled, then
    /// local history.
    fn revision_history(
        &self,
        working_copy: &Path,
        limit: usize,
    ) -> Result<Vec<RevisionHistoryEntry>>;
}
