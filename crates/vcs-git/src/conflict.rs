//! Push outcome classification and rollback of rejected commits.

use std::path::PathBuf;

use git2::{Oid, Repository, ResetType};

use crate::{Error, Result};

/// Status of a single ref update reported by a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Ok,
    UpToDate,
    Rejected(String),
}

/// One ref update within a push result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub refname: String,
    pub outcome: PushOutcome,
}

impl RefUpdate {
    pub fn new(refname: impl Into<String>, outcome: PushOutcome) -> Self {
        Self {
            refname: refname.into(),
            outcome,
        }
    }
}

/// Verdict over a whole push result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushVerdict {
    Success,
    Conflict(String),
}

/// The local commit a publish attempt is carrying.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingCommit {
    pub commit: Oid,
    pub parent: Option<Oid>,
}

/// Where the shadow cache's branch, and the working copy's view of it, stood
/// before the first push hop.
#[derive(Debug, Clone)]
pub(crate) struct CacheCheckpoint {
    pub cache: PathBuf,
    pub refname: String,
    pub previous: Option<Oid>,
    pub tracking_ref: String,
    pub tracking: Option<Oid>,
}

/// Classifies push results and undoes commits that could not be published.
pub struct ConflictHandler;

impl ConflictHandler {
    /// A push succeeds only if every ref update is OK or already up to date.
    ///
    /// One rejected ref fails the whole push even when others went through.
    pub fn classify(updates: &[RefUpdate]) -> PushVerdict {
        let rejected: Vec<String> = updates
            .iter()
            .filter_map(|update| match &update.outcome {
                PushOutcome::Rejected(reason) => Some(format!(
                    "The push of [{}] was rejected: {}",
                    update.refname, reason
                )),
                PushOutcome::Ok | PushOutcome::UpToDate => None,
            })
            .collect();

        if rejected.is_empty() {
            PushVerdict::Success
        } else {
            PushVerdict::Conflict(rejected.join("; "))
        }
    }

    /// Turn a push result into an error when it is a conflict.
    pub fn check(updates: &[RefUpdate]) -> Result<()> {
        match Self::classify(updates) {
            PushVerdict::Success => Ok(()),
            PushVerdict::Conflict(detail) => {
                tracing::debug!(detail = %detail, "Push rejected");
                Err(Error::conflict(detail))
            }
        }
    }

    /// Roll back `pending` after a failed publish and hand back the error to
    /// surface.
    ///
    /// The working copy gets a mixed reset to the commit's first parent (or to
    /// the commit itself when it has none), keeping its changes as
    /// modifications. A cache branch that already received the commit is moved
    /// back to where it was.
    pub(crate) fn recover(
        repo: &Repository,
        pending: PendingCommit,
        checkpoint: Option<&CacheCheckpoint>,
        original: Error,
    ) -> Error {
        tracing::warn!(
            commit = %pending.commit,
            error = %original,
            "Publishing failed, rolling back local commit"
        );
        match Self::rollback(repo, pending, checkpoint) {
            Ok(()) => original,
            Err(rollback) => {
                tracing::error!(error = %rollback, "Rollback failed");
                Error::RollbackFailed {
                    original: Box::new(original),
                    rollback: Box::new(rollback),
                }
            }
        }
    }

    fn rollback(
        repo: &Repository,
        pending: PendingCommit,
        checkpoint: Option<&CacheCheckpoint>,
    ) -> Result<()> {
        if let Some(checkpoint) = checkpoint {
            restore_cache(checkpoint)?;
            restore_ref(repo, &checkpoint.tracking_ref, checkpoint.tracking)?;
        }

        let target = pending.parent.unwrap_or(pending.commit);
        let object = repo.find_object(target, None)?;
        repo.reset(&object, ResetType::Mixed, None)?;
        tracing::debug!(revision = %target, "Local commit rolled back");
        Ok(())
    }
}

fn restore_cache(checkpoint: &CacheCheckpoint) -> Result<()> {
    let cache = Repository::open_bare(&checkpoint.cache)?;
    restore_ref(&cache, &checkpoint.refname, checkpoint.previous)?;
    tracing::debug!(refname = %checkpoint.refname, "Shadow cache ref restored");
    Ok(())
}

fn restore_ref(repo: &Repository, refname: &str, previous: Option<Oid>) -> Result<()> {
    match previous {
        Some(previous) => {
            repo.reference(refname, previous, true, "rollback: unpublished commit")?;
        }
        None => {
            if let Ok(mut reference) = repo.find_reference(refname) {
                reference.delete()?;
            }
        }
    }
    Ok(())
}
