//! Working-copy git operations shared by the engine.

use git2::build::CheckoutBuilder;
use git2::{BranchType, IndexAddOption, MergeOptions, Repository, ResetType, Signature};

use crate::auth::AuthenticationContext;
use crate::conflict::PendingCommit;
use crate::revision::{ORIGIN, ResolvedRef, RevisionResolver};
use crate::settings::{CommitterSettings, non_blank};
use crate::{Error, Result, transport};

/// Identity used when neither settings nor git config name a committer.
pub const DEFAULT_COMMITTER_NAME: &str = "vcs-sync";
pub const DEFAULT_COMMITTER_EMAIL: &str = "vcs-sync@localhost";

/// Checkout that refuses to overwrite local modifications.
fn safe_checkout() -> CheckoutBuilder<'static> {
    let mut builder = CheckoutBuilder::new();
    builder.safe();
    builder
}

/// Fetch `origin` (the shadow cache) into the working copy's tracking refs.
pub(crate) fn fetch_origin(repo: &Repository) -> Result<()> {
    let mut remote = repo.find_remote(ORIGIN)?;
    transport::fetch(&mut remote, &AuthenticationContext::None)
}

/// Discard all local modifications.
pub(crate) fn hard_reset(repo: &Repository) -> Result<()> {
    let head = repo.head()?.peel_to_commit()?;
    repo.reset(head.as_object(), ResetType::Hard, None)?;
    tracing::debug!(revision = %head.id(), "Working copy reset");
    Ok(())
}

/// Create a local branch tracking `origin/<name>` unless one exists.
pub(crate) fn track_remote_branch(repo: &Repository, name: &str) -> Result<()> {
    if repo.find_branch(name, BranchType::Local).is_ok() {
        return Ok(());
    }

    let upstream = format!("{ORIGIN}/{name}");
    let target = repo
        .find_branch(&upstream, BranchType::Remote)?
        .get()
        .peel_to_commit()?;
    let mut branch = repo.branch(name, &target, false)?;
    branch.set_upstream(Some(upstream.as_str()))?;
    tracing::debug!(branch = name, upstream = %upstream, "Created tracking branch");
    Ok(())
}

/// Check out `revision`, attaching to it when it names a branch.
///
/// Fails with a conflict when uncommitted changes would be overwritten.
pub(crate) fn checkout(repo: &Repository, revision: &str) -> Result<()> {
    let resolved = RevisionResolver::resolve(repo, revision)?;
    if let ResolvedRef::RemoteBranch(name) = &resolved {
        track_remote_branch(repo, name)?;
    }

    match resolved {
        ResolvedRef::LocalBranch(name) | ResolvedRef::RemoteBranch(name) => {
            let refname = format!("refs/heads/{name}");
            let commit = repo.find_reference(&refname)?.peel_to_commit()?;
            repo.checkout_tree(commit.as_object(), Some(&mut safe_checkout()))
                .map_err(Error::from)
                .map_err(Error::reclassify)?;
            repo.set_head(&refname)?;
        }
        ResolvedRef::Tag { target, .. } | ResolvedRef::Commit(target) => {
            let commit = repo.find_commit(target)?;
            repo.checkout_tree(commit.as_object(), Some(&mut safe_checkout()))
                .map_err(Error::from)
                .map_err(Error::reclassify)?;
            repo.set_head_detached(target)?;
        }
    }
    tracing::debug!(revision, "Checked out");
    Ok(())
}

/// Bring `branch` (which must be checked out) up to date with its
/// remote-tracking branch.
///
/// Fast-forwards when possible, otherwise merges. A merge that would conflict
/// leaves the working copy untouched and fails with a conflict.
pub(crate) fn merge_upstream(repo: &Repository, branch: &str, sig: &Signature<'_>) -> Result<()> {
    let Some(upstream) = RevisionResolver::remote_tracking(repo, branch) else {
        tracing::debug!(branch, "No remote-tracking branch, nothing to pull");
        return Ok(());
    };

    let annotated = repo.find_annotated_commit(upstream)?;
    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        tracing::trace!(branch, "Already up to date");
        return Ok(());
    }

    let refname = format!("refs/heads/{branch}");
    if analysis.is_fast_forward() || analysis.is_unborn() {
        let target = repo.find_commit(upstream)?;
        repo.checkout_tree(target.as_object(), Some(&mut safe_checkout()))
            .map_err(Error::from)
            .map_err(Error::reclassify)?;
        repo.reference(&refname, upstream, true, "pull: fast-forward")?;
        tracing::debug!(branch, revision = %upstream, "Fast-forwarded");
        return Ok(());
    }

    let mut merge_options = MergeOptions::new();
    merge_options.fail_on_conflict(true);
    let merged = repo.merge(
        &[&annotated],
        Some(&mut merge_options),
        Some(&mut safe_checkout()),
    );
    if let Err(e) = merged {
        repo.cleanup_state()?;
        return Err(Error::from(e).reclassify());
    }

    let mut index = repo.index()?;
    if index.has_conflicts() {
        repo.cleanup_state()?;
        return Err(Error::conflict(format!(
            "merging origin/{branch} into {branch} produced conflicts"
        )));
    }

    let tree = repo.find_tree(index.write_tree()?)?;
    let head = repo.head()?.peel_to_commit()?;
    let theirs = repo.find_commit(upstream)?;
    let message = format!("Merge remote-tracking branch '{ORIGIN}/{branch}'");
    let merge_commit = repo.commit(Some("HEAD"), sig, sig, &message, &tree, &[&head, &theirs])?;
    repo.cleanup_state()?;
    tracing::debug!(branch, revision = %merge_commit, "Merged upstream");
    Ok(())
}

/// Committer identity: settings first, then git config, then the built-in one.
pub(crate) fn signature(
    repo: &Repository,
    committer: Option<&CommitterSettings>,
) -> Result<Signature<'static>> {
    if let Some(committer) = committer {
        let name = non_blank(Some(&committer.name)).unwrap_or(DEFAULT_COMMITTER_NAME);
        let email = non_blank(Some(&committer.email)).unwrap_or(DEFAULT_COMMITTER_EMAIL);
        return Ok(Signature::now(name, email)?);
    }
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(_) => Ok(Signature::now(DEFAULT_COMMITTER_NAME, DEFAULT_COMMITTER_EMAIL)?),
    }
}

/// Stage modifications and deletions of tracked files.
pub(crate) fn stage_tracked(repo: &Repository) -> Result<()> {
    let mut index = repo.index()?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;
    Ok(())
}

/// Stage new, modified and deleted files under each of `paths`.
pub(crate) fn stage_paths(repo: &Repository, paths: &[String]) -> Result<()> {
    let mut index = repo.index()?;
    index.add_all(paths.iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(paths.iter(), None)?;
    index.write()?;
    Ok(())
}

/// Stage every change in the working copy.
pub(crate) fn stage_all(repo: &Repository) -> Result<()> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.write()?;
    Ok(())
}

/// Commit the index on top of `HEAD`.
pub(crate) fn commit_index(
    repo: &Repository,
    message: &str,
    sig: &Signature<'_>,
) -> Result<PendingCommit> {
    let mut index = repo.index()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let commit = repo.commit(Some("HEAD"), sig, sig, message, &tree, &parents)?;
    tracing::debug!(revision = %commit, "Created commit");
    Ok(PendingCommit {
        commit,
        parent: parent.map(|p| p.id()),
    })
}
