//! Startup synchronization driven by [`SyncSettings`].

use std::path::{Path, PathBuf};

use vcs_fs::io::display_path;

use crate::engine::SyncEngine;
use crate::provider::VersionControl;
use crate::settings::SyncSettings;
use crate::state::SyncState;
use crate::Result;

/// Brings the configured working copy up to date when an application starts.
///
/// Missing `local_url` or `remote_url` settings turn every operation into a
/// logged no-op.
pub struct Bootstrap<V> {
    settings: SyncSettings,
    vcs: V,
}

impl Bootstrap<SyncEngine> {
    pub fn from_settings(settings: SyncSettings) -> Result<Self> {
        let vcs = SyncEngine::from_settings(&settings)?;
        Ok(Self::new(settings, vcs))
    }
}

impl<V: VersionControl> Bootstrap<V> {
    pub fn new(settings: SyncSettings, vcs: V) -> Self {
        Self { settings, vcs }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Check out the working copy if it is missing, then update it.
    ///
    /// Returns the resulting revision, or `None` when nothing is configured.
    pub fn update(&self) -> Result<Option<String>> {
        let Some(working_copy) = self.settings.working_copy()? else {
            tracing::info!("local_url not configured, skipping repository update");
            return Ok(None);
        };

        tracing::info!(
            implementation = self.vcs.implementation_name(),
            path = %display_path(&working_copy).display(),
            "Checking local repository"
        );
        if !SyncState::detect(&working_copy)?.has_working_copy() {
            tracing::info!(
                path = %working_copy.display(),
                "Local repository does not exist, performing fresh checkout"
            );
            let Some(remote_url) = self.remote_url() else {
                return Ok(None);
            };
            self.fresh_checkout(remote_url, &working_copy)?;
        }

        self.update_working_copy(&working_copy).map(Some)
    }

    /// Check out the working copy, then update it.
    pub fn checkout(&self) -> Result<Option<String>> {
        let (Some(working_copy), Some(remote_url)) =
            (self.settings.working_copy()?, self.remote_url())
        else {
            tracing::info!("local_url/remote_url not configured, skipping repository checkout");
            return Ok(None);
        };

        self.fresh_checkout(remote_url, &working_copy)?;
        self.update_working_copy(&working_copy).map(Some)
    }

    fn remote_url(&self) -> Option<&str> {
        let remote_url = self.settings.remote_url();
        if remote_url.is_none() {
            tracing::info!("remote_url not configured, skipping repository checkout");
        }
        remote_url
    }

    fn fresh_checkout(&self, remote_url: &str, working_copy: &Path) -> Result<String> {
        tracing::info!(path = %working_copy.display(), "Checking out local repository");
        let revision = match self.settings.revision() {
            Some(revision) => self.vcs.checkout_revision(remote_url, working_copy, revision)?,
            None => self.vcs.checkout(remote_url, working_copy)?,
        };
        tracing::info!(revision = %revision, "Checkout complete");
        Ok(revision)
    }

    fn update_working_copy(&self, working_copy: &Path) -> Result<String> {
        let revision = match self.settings.revision() {
            Some(revision) => {
                tracing::info!(revision, "Updating local repository to configured revision");
                self.vcs.update_revision(working_copy, revision)?
            }
            None => {
                tracing::info!("Updating local repository to latest revision");
                self.vcs.update(working_copy)?
            }
        };
        tracing::info!(
            path = %display_path(working_copy).display(),
            revision = %revision,
            "Local repository up to date"
        );
        Ok(revision)
    }

    /// Resolved working copy path, if configured.
    pub fn working_copy(&self) -> Result<Option<PathBuf>> {
        self.settings.working_copy()
    }
}
