//! Revision and reference resolution for working copies.

use git2::{BranchType, Oid, Repository};

use crate::{Error, Result};

/// Name of the remote every working copy and cache uses.
pub const ORIGIN: &str = "origin";

/// What a revision name refers to in a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRef {
    LocalBranch(String),
    /// A remote branch with no local counterpart yet.
    RemoteBranch(String),
    Tag { name: String, target: Oid },
    Commit(Oid),
}

/// Resolves positions and names in a repository to canonical revisions.
pub struct RevisionResolver;

impl RevisionResolver {
    /// Revision id of the commit `HEAD` points at.
    pub fn local_revision(repo: &Repository) -> Result<String> {
        Ok(Self::head_oid(repo)?.to_string())
    }

    pub fn head_oid(repo: &Repository) -> Result<Oid> {
        Ok(repo.head()?.peel_to_commit()?.id())
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if HEAD is detached.
    pub fn current_branch(repo: &Repository) -> Result<Option<String>> {
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(String::from))
        } else {
            Ok(None)
        }
    }

    /// The branch a working copy follows by default.
    ///
    /// Prefers the target of `origin/HEAD`, then a local `main` or `master`,
    /// then the first local branch.
    pub fn default_branch(repo: &Repository) -> Option<String> {
        let origin_head = format!("refs/remotes/{ORIGIN}/HEAD");
        let prefix = format!("refs/remotes/{ORIGIN}/");
        let symbolic = repo
            .find_reference(&origin_head)
            .ok()
            .and_then(|r| r.symbolic_target().map(String::from));
        if let Some(branch) = symbolic.as_deref().and_then(|t| t.strip_prefix(&prefix)) {
            return Some(branch.to_string());
        }

        for candidate in ["main", "master"] {
            if repo.find_branch(candidate, BranchType::Local).is_ok() {
                return Some(candidate.to_string());
            }
        }

        repo.branches(Some(BranchType::Local))
            .ok()?
            .flatten()
            .find_map(|(branch, _)| branch.name().ok().flatten().map(String::from))
    }

    /// Tip of `origin/<branch>`, if the working copy knows it.
    pub fn remote_tracking(repo: &Repository, branch: &str) -> Option<Oid> {
        repo.refname_to_id(&format!("refs/remotes/{ORIGIN}/{branch}"))
            .ok()
    }

    /// Whether `name` is a branch on the remote.
    pub fn is_remote_branch(repo: &Repository, name: &str) -> bool {
        let matched = Self::remote_tracking(repo, name).is_some();
        if matched {
            tracing::trace!(name, "Matched tag/branch against remote branch; assuming branch checkout");
        }
        matched
    }

    /// Resolve `name`, branches taking precedence over tags and commit ids.
    pub fn resolve(repo: &Repository, name: &str) -> Result<ResolvedRef> {
        if repo.find_branch(name, BranchType::Local).is_ok() {
            return Ok(ResolvedRef::LocalBranch(name.to_string()));
        }
        if Self::remote_tracking(repo, name).is_some() {
            return Ok(ResolvedRef::RemoteBranch(name.to_string()));
        }
        if let Ok(tag) = repo.find_reference(&format!("refs/tags/{name}")) {
            let target = tag.peel_to_commit()?.id();
            return Ok(ResolvedRef::Tag {
                name: name.to_string(),
                target,
            });
        }

        let not_found = || Error::RevisionNotFound {
            name: name.to_string(),
        };
        let object = repo.revparse_single(name).map_err(|_| not_found())?;
        let commit = object.peel_to_commit().map_err(|_| not_found())?;
        Ok(ResolvedRef::Commit(commit.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_with_commit() -> (TempDir, Repository, Oid) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let oid = {
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
                .unwrap()
        };
        (temp, repo, oid)
    }

    #[test]
    fn local_revision_is_head_commit() {
        let (_temp, repo, oid) = repo_with_commit();
        assert_eq!(RevisionResolver::local_revision(&repo).unwrap(), oid.to_string());
    }

    #[test]
    fn current_branch_none_when_detached() {
        let (_temp, repo, oid) = repo_with_commit();
        assert!(RevisionResolver::current_branch(&repo).unwrap().is_some());
        repo.set_head_detached(oid).unwrap();
        assert_eq!(RevisionResolver::current_branch(&repo).unwrap(), None);
    }

    #[test]
    fn unborn_head_has_no_branch() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        assert_eq!(RevisionResolver::current_branch(&repo).unwrap(), None);
    }

    #[test]
    fn branch_beats_tag_of_same_name() {
        let (_temp, repo, oid) = repo_with_commit();
        let commit = repo.find_commit(oid).unwrap();
        repo.branch("release", &commit, false).unwrap();
        repo.tag_lightweight("release", commit.as_object(), false)
            .unwrap();
        repo.tag_lightweight("v1", commit.as_object(), false).unwrap();

        assert_eq!(
            RevisionResolver::resolve(&repo, "release").unwrap(),
            ResolvedRef::LocalBranch("release".into())
        );
        assert_eq!(
            RevisionResolver::resolve(&repo, "v1").unwrap(),
            ResolvedRef::Tag {
                name: "v1".into(),
                target: oid
            }
        );
        assert_eq!(
            RevisionResolver::resolve(&repo, &oid.to_string()).unwrap(),
            ResolvedRef::Commit(oid)
        );
    }

    #[test]
    fn unknown_revision_is_not_found() {
        let (_temp, repo, _) = repo_with_commit();
        assert!(matches!(
            RevisionResolver::resolve(&repo, "no-such-thing"),
            Err(Error::RevisionNotFound { .. })
        ));
    }

    #[test]
    fn default_branch_falls_back_to_local_branch() {
        let (_temp, repo, _) = repo_with_commit();
        let current = RevisionResolver::current_branch(&repo).unwrap();
        assert_eq!(RevisionResolver::default_branch(&repo), current);
    }
}
