//! Revision history extraction for working copies.

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use serde::Serialize;

use crate::Result;

/// One commit in a revision history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionHistoryEntry {
    /// Full commit id
    pub revision: String,

    /// Full commit message
    pub message: String,

    /// Commit author name
    pub author: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// Commits reachable from `remote` but not from `local`, newest first.
pub(crate) fn remote_only(
    repo: &Repository,
    local: Oid,
    remote: Oid,
    max_count: usize,
) -> Result<Vec<RevisionHistoryEntry>> {
    walk(repo, remote, Some(local), max_count)
}

/// Commits reachable from `start`, newest first.
pub(crate) fn reachable_from(
    repo: &Repository,
    start: Oid,
    max_count: usize,
) -> Result<Vec<RevisionHistoryEntry>> {
    walk(repo, start, None, max_count)
}

fn walk(
    repo: &Repository,
    start: Oid,
    hide: Option<Oid>,
    max_count: usize,
) -> Result<Vec<RevisionHistoryEntry>> {
    if max_count == 0 {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.push(start)?;
    if let Some(hide) = hide {
        revwalk.hide(hide)?;
    }
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    let mut entries = Vec::with_capacity(max_count);
    for oid in revwalk.take(max_count) {
        entries.push(entry(repo, oid?)?);
    }
    Ok(entries)
}

fn entry(repo: &Repository, oid: Oid) -> Result<RevisionHistoryEntry> {
    let commit = repo.find_commit(oid)?;
    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();

    Ok(RevisionHistoryEntry {
        revision: oid.to_string(),
        message: commit.message().unwrap_or("").to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        timestamp,
    })
}
