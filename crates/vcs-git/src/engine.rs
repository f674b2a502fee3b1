//! Git implementation of [`VersionControl`] built on the shadow cache.

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{AutotagOption, FetchOptions, Repository};
use vcs_fs::{io, to_unix_path};

use crate::auth::{AuthenticationContext, AuthenticationResolver};
use crate::conflict::{CacheCheckpoint, ConflictHandler};
use crate::history::{self, RevisionHistoryEntry};
use crate::provider::VersionControl;
use crate::revision::{ORIGIN, RevisionResolver};
use crate::settings::{CommitterSettings, SyncSettings};
use crate::shadow::{REMOTE_CONFIG_KEY, RemoteUrl, ShadowRepositoryCache};
use crate::state::{self, SyncState};
use crate::{Error, Result, helpers, transport};

/// Keeps working copies in sync with their remotes.
///
/// Holds no per-working-copy state; one engine can serve many working copies.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    auth: AuthenticationContext,
    clean_update: bool,
    committer: Option<CommitterSettings>,
}

impl SyncEngine {
    pub fn new(auth: AuthenticationContext) -> Self {
        Self {
            auth,
            clean_update: false,
            committer: None,
        }
    }

    /// Build an engine from settings, resolving authentication once.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        let auth = AuthenticationResolver::new().resolve(settings)?;
        tracing::debug!(auth = %auth, "Resolved authentication");
        let mut engine = Self::new(auth).with_clean_update(settings.clean_update);
        engine.committer = settings.committer.clone();
        Ok(engine)
    }

    /// Hard-reset working copies before every update.
    pub fn with_clean_update(mut self, clean_update: bool) -> Self {
        self.clean_update = clean_update;
        self
    }

    pub fn with_committer(mut self, committer: CommitterSettings) -> Self {
        self.committer = Some(committer);
        self
    }

    pub fn auth(&self) -> &AuthenticationContext {
        &self.auth
    }

    fn cache(&self) -> ShadowRepositoryCache<'_> {
        ShadowRepositoryCache::new(&self.auth)
    }

    /// Clone a fresh working copy from the (refreshed) shadow cache.
    fn clone_working_copy(&self, remote_url: &str, working_copy: &Path) -> Result<Repository> {
        let remote = RemoteUrl::parse(remote_url);
        if SyncState::detect(working_copy)? != SyncState::Absent {
            return Err(Error::WorkingCopyExists {
                path: working_copy.to_path_buf(),
            });
        }

        tracing::info!(
            path = %working_copy.display(),
            remote = %remote.url,
            branch = ?remote.branch,
            "Performing checkout"
        );
        let cache = self.cache().ensure(&remote.url, working_copy)?;

        let existed = working_copy.exists();
        io::ensure_parent_dir(working_copy)?;

        let mut fetch = FetchOptions::new();
        fetch.download_tags(AutotagOption::All);
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch);
        if let Some(branch) = &remote.branch {
            builder.branch(branch);
        }

        let repo = match builder.clone(&cache.to_string_lossy(), working_copy) {
            Ok(repo) => repo,
            Err(e) => {
                if !existed {
                    io::remove_dir_quietly(working_copy);
                }
                return Err(e.into());
            }
        };
        repo.config()?.set_str(REMOTE_CONFIG_KEY, &remote.url)?;
        Ok(repo)
    }

    /// Refresh (or adopt) the shadow cache, optionally reset, then fetch.
    fn prepare_update(&self, working_copy: &Path) -> Result<Repository> {
        let repo = match SyncState::detect(working_copy)? {
            SyncState::CheckedOut => {
                self.cache().refresh(working_copy)?;
                state::open_working_copy(working_copy)?
            }
            SyncState::Unmanaged => {
                let repo = state::open_working_copy(working_copy)?;
                self.cache().adopt(&repo, working_copy)?;
                repo
            }
            SyncState::Absent | SyncState::Blocked => {
                return Err(Error::NotARepository {
                    path: working_copy.to_path_buf(),
                });
            }
        };

        if self.clean_update {
            tracing::info!(path = %working_copy.display(), "Discarding local changes");
            helpers::hard_reset(&repo)?;
        }
        helpers::fetch_origin(&repo)?;
        Ok(repo)
    }

    /// Open a working copy and bring its shadow cache up to date.
    fn open_synced(&self, working_copy: &Path) -> Result<Repository> {
        let repo = state::open_working_copy(working_copy)?;
        if ShadowRepositoryCache::is_present(working_copy)? {
            self.cache().refresh(working_copy)?;
        } else {
            self.cache().adopt(&repo, working_copy)?;
        }
        Ok(repo)
    }

    /// The branch `HEAD` is on, attaching a detached `HEAD` to the default
    /// branch first.
    fn attach_to_branch(&self, repo: &Repository) -> Result<String> {
        if let Some(branch) = RevisionResolver::current_branch(repo)? {
            return Ok(branch);
        }
        let branch = RevisionResolver::default_branch(repo).ok_or_else(|| {
            Error::configuration("HEAD is detached and the repository has no default branch")
        })?;
        tracing::debug!(branch = %branch, "Returning detached HEAD to default branch");
        helpers::checkout(repo, &branch)?;
        Ok(branch)
    }

    fn pull(&self, repo: &Repository, branch: &str) -> Result<()> {
        let sig = helpers::signature(repo, self.committer.as_ref())?;
        helpers::merge_upstream(repo, branch, &sig)
    }

    /// Commit the index and push it through the cache to the true remote,
    /// rolling the commit back if either hop fails.
    fn commit_and_publish(
        &self,
        repo: &Repository,
        working_copy: &Path,
        message: &str,
    ) -> Result<String> {
        let branch = RevisionResolver::current_branch(repo)?
            .ok_or_else(|| Error::configuration("cannot commit on a detached HEAD"))?;
        let refname = format!("refs/heads/{branch}");
        let tracking_ref = format!("refs/remotes/{ORIGIN}/{branch}");
        let cache_path = ShadowRepositoryCache::path_for(working_copy)?;

        let checkpoint = CacheCheckpoint {
            previous: ShadowRepositoryCache::branch_tip(&cache_path, &refname),
            cache: cache_path,
            refname: refname.clone(),
            tracking: repo.refname_to_id(&tracking_ref).ok(),
            tracking_ref,
        };

        let sig = helpers::signature(repo, self.committer.as_ref())?;
        let pending = helpers::commit_index(repo, message, &sig)?;

        if let Err(e) = push_to_cache(repo, &refname) {
            return Err(ConflictHandler::recover(repo, pending, None, e));
        }

        let published = self
            .cache()
            .publish(working_copy, &refname)
            .and_then(|updates| ConflictHandler::check(&updates));
        if let Err(e) = published {
            return Err(ConflictHandler::recover(repo, pending, Some(&checkpoint), e));
        }

        tracing::info!(branch = %branch, revision = %pending.commit, "Published commit");
        Ok(pending.commit.to_string())
    }

    /// HEAD, and the tip of the remote-tracking branch it is compared against.
    fn local_and_remote(&self, repo: &Repository) -> Result<(git2::Oid, Option<git2::Oid>)> {
        let local = RevisionResolver::head_oid(repo)?;
        let branch = match RevisionResolver::current_branch(repo)? {
            Some(branch) => Some(branch),
            None => RevisionResolver::default_branch(repo),
        };
        let remote = branch.and_then(|b| RevisionResolver::remote_tracking(repo, &b));
        Ok((local, remote))
    }
}

fn push_to_cache(repo: &Repository, refname: &str) -> Result<()> {
    let mut origin = repo.find_remote(ORIGIN)?;
    let updates = transport::push(
        &mut origin,
        &[format!("{refname}:{refname}")],
        &AuthenticationContext::None,
    )?;
    ConflictHandler::check(&updates)
}

impl VersionControl for SyncEngine {
    fn implementation_name(&self) -> &'static str {
        "Git"
    }

    fn test_connection(&self, remote_url: &str) -> Result<Option<String>> {
        let remote = RemoteUrl::parse(remote_url);
        tracing::debug!(remote = %remote.url, auth = %self.auth, "Testing connection");
        transport::ls_remote_head(&remote.url, &self.auth)
    }

    fn checkout(&self, remote_url: &str, working_copy: &Path) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let repo = self
            .clone_working_copy(remote_url, &working_copy)
            .map_err(Error::reclassify)?;
        RevisionResolver::local_revision(&repo)
    }

    fn checkout_revision(
        &self,
        remote_url: &str,
        working_copy: &Path,
        revision: &str,
    ) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let existed = working_copy.exists();
        let repo = self
            .clone_working_copy(remote_url, &working_copy)
            .map_err(Error::reclassify)?;
        let result = helpers::checkout(&repo, revision)
            .and_then(|()| RevisionResolver::local_revision(&repo));
        if result.is_err() && !existed {
            drop(repo);
            io::remove_dir_quietly(&working_copy);
        }
        result.map_err(Error::reclassify)
    }

    fn update(&self, working_copy: &Path) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let result = (|| -> Result<String> {
            tracing::info!(path = %working_copy.display(), "Updating working copy");
            let repo = self.prepare_update(&working_copy)?;
            let branch = self.attach_to_branch(&repo)?;
            self.pull(&repo, &branch)?;
            helpers::checkout(&repo, &branch)?;
            RevisionResolver::local_revision(&repo)
        })();
        result.map_err(Error::reclassify)
    }

    fn update_revision(&self, working_copy: &Path, revision: &str) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let result = (|| -> Result<String> {
            tracing::info!(path = %working_copy.display(), revision, "Updating working copy");
            let repo = self.prepare_update(&working_copy)?;
            if RevisionResolver::is_remote_branch(&repo, revision) {
                helpers::track_remote_branch(&repo, revision)?;
                helpers::checkout(&repo, revision)?;
                self.pull(&repo, revision)?;
            } else {
                let branch = self.attach_to_branch(&repo)?;
                self.pull(&repo, &branch)?;
            }
            helpers::checkout(&repo, revision)?;
            RevisionResolver::local_revision(&repo)
        })();
        result.map_err(Error::reclassify)
    }

    fn commit(&self, working_copy: &Path, message: &str) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let result = (|| -> Result<String> {
            let repo = self.open_synced(&working_copy)?;
            helpers::stage_tracked(&repo)?;
            self.commit_and_publish(&repo, &working_copy, message)
        })();
        result.map_err(Error::reclassify)
    }

    fn add_and_commit(
        &self,
        working_copy: &Path,
        message: &str,
        files: &[&str],
    ) -> Result<Option<String>> {
        if files.is_empty() {
            tracing::debug!("No files to add, skipping commit");
            return Ok(None);
        }

        let working_copy = state::absolute(working_copy)?;
        let paths: Vec<String> = files.iter().map(|f| to_unix_path(f)).collect();
        let result = (|| -> Result<String> {
            let repo = self.open_synced(&working_copy)?;
            helpers::stage_paths(&repo, &paths)?;
            self.commit_and_publish(&repo, &working_copy, message)
        })();
        result.map(Some).map_err(Error::reclassify)
    }

    fn recursive_add(&self, working_copy: &Path) -> Result<()> {
        let repo = state::open_working_copy(working_copy)?;
        helpers::stage_all(&repo)
    }

    fn local_revision(&self, working_copy: &Path) -> Result<String> {
        let repo = state::open_working_copy(working_copy)?;
        RevisionResolver::local_revision(&repo)
    }

    fn remote_revision(&self, working_copy: &Path) -> Result<String> {
        let working_copy = state::absolute(working_copy)?;
        let repo = self.open_synced(&working_copy)?;
        helpers::fetch_origin(&repo)?;

        let (local, remote) = self.local_and_remote(&repo)?;
        let newest = match remote {
            Some(remote) => history::remote_only(&repo, local, remote, 1)?
                .into_iter()
                .next()
                .map(|entry| entry.revision),
            None => None,
        };
        Ok(newest.unwrap_or_else(|| local.to_string()))
    }

    fn revision_history(
        &self,
        working_copy: &Path,
        limit: usize,
    ) -> Result<Vec<RevisionHistoryEntry>> {
        let working_copy = state::absolute(working_copy)?;
        let repo = self.open_synced(&working_copy)?;
        helpers::fetch_origin(&repo)?;

        let (local, remote) = self.local_and_remote(&repo)?;
        let mut entries = match remote {
            Some(remote) => history::remote_only(&repo, local, remote, limit)?,
            None => Vec::new(),
        };
        if entries.len() < limit {
            entries.extend(history::reachable_from(&repo, local, limit - entries.len())?);
        }
        Ok(entries)
    }
}
