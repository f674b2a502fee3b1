//! The shadow repository cache.
//!
//! Every working copy `<dir>/<name>` gets a bare mirror of its remote at
//! `<dir>/<name>.shadow.git`. The working copy's `origin` points at the mirror,
//! so only the mirror ever talks to the true remote.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository};
use vcs_fs::io;

use crate::auth::AuthenticationContext;
use crate::conflict::RefUpdate;
use crate::revision::ORIGIN;
use crate::{Error, Result, transport};

/// Suffix appended to the working copy's directory name.
pub const SHADOW_SUFFIX: &str = ".shadow.git";

/// Mirror every ref of the remote.
const MIRROR_REFSPEC: &str = "+refs/*:refs/*";

/// Git config key under which a working copy records its true remote.
pub const REMOTE_CONFIG_KEY: &str = "vcs-sync.remote";

/// A remote location, optionally annotated with the branch to check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub url: String,
    pub branch: Option<String>,
}

impl RemoteUrl {
    /// Split a `?branch=<name>` annotation off `raw`.
    ///
    /// Query strings without a `branch` parameter are left in place.
    pub fn parse(raw: &str) -> Self {
        if let Some((base, query)) = raw.split_once('?') {
            let branch = url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "branch")
                .map(|(_, value)| value.trim().to_string());
            if let Some(branch) = branch {
                return Self {
                    url: base.to_string(),
                    branch: Some(branch).filter(|b| !b.is_empty()),
                };
            }
        }
        Self {
            url: raw.to_string(),
            branch: None,
        }
    }
}

/// Manages the bare mirror beside a working copy.
pub struct ShadowRepositoryCache<'a> {
    auth: &'a AuthenticationContext,
}

impl<'a> ShadowRepositoryCache<'a> {
    pub fn new(auth: &'a AuthenticationContext) -> Self {
        Self { auth }
    }

    /// Location of the cache for `working_copy`.
    pub fn path_for(working_copy: &Path) -> Result<PathBuf> {
        let name = working_copy.file_name().ok_or_else(|| {
            Error::configuration(format!(
                "working copy path {} has no directory name",
                working_copy.display()
            ))
        })?;
        let mut cache_name = name.to_os_string();
        cache_name.push(SHADOW_SUFFIX);
        Ok(working_copy.with_file_name(cache_name))
    }

    /// Whether a usable cache exists for `working_copy`.
    pub fn is_present(working_copy: &Path) -> Result<bool> {
        let path = Self::path_for(working_copy)?;
        Ok(path.exists() && Repository::open_bare(&path).is_ok())
    }

    /// Tip of `refname` in the cache at `cache`, if it exists.
    pub fn branch_tip(cache: &Path, refname: &str) -> Option<Oid> {
        Repository::open_bare(cache)
            .ok()?
            .refname_to_id(refname)
            .ok()
    }

    /// Make sure a cache of `remote_url` exists for `working_copy`, creating
    /// or refreshing it as needed.
    ///
    /// An existing cache that mirrors a different remote is left untouched and
    /// reported as a configuration error.
    pub fn ensure(&self, remote_url: &str, working_copy: &Path) -> Result<PathBuf> {
        if Self::is_present(working_copy)? {
            let path = Self::path_for(working_copy)?;
            let mirrored = mirrored_remote(&path)?;
            if mirrored != remote_url {
                return Err(Error::configuration(format!(
                    "shadow cache {} mirrors '{}', not '{}'",
                    path.display(),
                    mirrored,
                    remote_url
                )));
            }
            return self.refresh(working_copy);
        }
        let path = Self::path_for(working_copy)?;
        self.create(remote_url, &path)?;
        Ok(path)
    }

    /// Fetch everything from the true remote into the existing cache.
    pub fn refresh(&self, working_copy: &Path) -> Result<PathBuf> {
        let path = Self::path_for(working_copy)?;
        let cache = Repository::open_bare(&path).map_err(|_| Error::NotARepository {
            path: path.clone(),
        })?;
        tracing::debug!(cache = %path.display(), "Refreshing shadow cache");
        let mut remote = cache.find_remote(ORIGIN)?;
        sync_head(&cache, &mut remote, self.auth)?;
        transport::fetch(&mut remote, self.auth)?;
        Ok(path)
    }

    /// Create a cache for a working copy that has none and point the working
    /// copy's `origin` at it.
    ///
    /// The true remote is the one recorded at checkout, falling back to the
    /// working copy's current `origin`.
    pub fn adopt(&self, repo: &Repository, working_copy: &Path) -> Result<PathBuf> {
        let path = Self::path_for(working_copy)?;
        let remote_url = true_remote(repo, &path)?;
        tracing::info!(
            path = %io::display_path(working_copy).display(),
            remote = %remote_url,
            "Working copy has no shadow cache, creating one"
        );
        self.create(&remote_url, &path)?;
        repo.remote_set_url(ORIGIN, &path.to_string_lossy())?;
        repo.config()?.set_str(REMOTE_CONFIG_KEY, &remote_url)?;
        Ok(path)
    }

    /// Push `refname` from the cache to the true remote.
    pub fn publish(&self, working_copy: &Path, refname: &str) -> Result<Vec<RefUpdate>> {
        let path = Self::path_for(working_copy)?;
        let cache = Repository::open_bare(&path).map_err(|_| Error::NotARepository {
            path: path.clone(),
        })?;
        let mut remote = cache.find_remote(ORIGIN)?;
        transport::push(&mut remote, &[format!("{refname}:{refname}")], self.auth)
    }

    fn create(&self, remote_url: &str, path: &Path) -> Result<()> {
        if path.exists() {
            tracing::warn!(cache = %path.display(), "Replacing unusable shadow cache");
            io::remove_dir_quietly(path);
        }
        io::ensure_parent_dir(path)?;
        tracing::info!(cache = %path.display(), remote = %remote_url, "Creating shadow cache");

        let cache = Repository::init_bare(path)?;
        let populated = (|| -> Result<()> {
            let mut remote = cache.remote_with_fetch(ORIGIN, remote_url, MIRROR_REFSPEC)?;
            cache.config()?.set_bool("remote.origin.mirror", true)?;
            sync_head(&cache, &mut remote, self.auth)?;
            transport::fetch(&mut remote, self.auth)
        })();

        if let Err(e) = populated {
            drop(cache);
            io::remove_dir_quietly(path);
            return Err(e);
        }
        Ok(())
    }
}

/// URL of the remote the cache at `path` mirrors.
fn mirrored_remote(path: &Path) -> Result<String> {
    let cache = Repository::open_bare(path).map_err(|_| Error::NotARepository {
        path: path.to_path_buf(),
    })?;
    let origin = cache.find_remote(ORIGIN)?;
    origin
        .url()
        .map(String::from)
        .ok_or_else(|| Error::configuration("shadow cache origin URL is not valid UTF-8"))
}

/// Point the cache's `HEAD` at the remote's default branch.
fn sync_head(
    cache: &Repository,
    remote: &mut git2::Remote<'_>,
    auth: &AuthenticationContext,
) -> Result<()> {
    if let Some(branch) = transport::default_branch(remote, auth)? {
        cache.set_head(&branch)?;
    }
    Ok(())
}

fn true_remote(repo: &Repository, cache: &Path) -> Result<String> {
    if let Ok(recorded) = repo.config()?.get_string(REMOTE_CONFIG_KEY) {
        return Ok(recorded);
    }

    let origin = repo.find_remote(ORIGIN).map_err(|_| {
        Error::configuration("working copy has no origin remote to build a shadow cache from")
    })?;
    let url = origin
        .url()
        .ok_or_else(|| Error::configuration("origin remote URL is not valid UTF-8"))?;
    if Path::new(url) == cache {
        return Err(Error::configuration(format!(
            "shadow cache {} is missing and no remote is recorded",
            cache.display()
        )));
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn cache_sits_beside_working_copy() {
        let path = ShadowRepositoryCache::path_for(Path::new("/srv/config")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/config.shadow.git"));
    }

    #[test]
    fn root_has_no_cache_location() {
        assert!(ShadowRepositoryCache::path_for(Path::new("/")).is_err());
    }

    #[rstest]
    #[case("https://host/repo.git", "https://host/repo.git", None)]
    #[case("https://host/repo.git?branch=dev", "https://host/repo.git", Some("dev"))]
    #[case("git@host:repo.git?branch=feature%2Fx", "git@host:repo.git", Some("feature/x"))]
    #[case("https://host/repo.git?token=abc", "https://host/repo.git?token=abc", None)]
    #[case("https://host/repo.git?branch=", "https://host/repo.git", None)]
    fn branch_annotation(#[case] raw: &str, #[case] url: &str, #[case] branch: Option<&str>) {
        let parsed = RemoteUrl::parse(raw);
        assert_eq!(parsed.url, url);
        assert_eq!(parsed.branch.as_deref(), branch);
    }
}
