//! Settings and engine for one invocation

use std::path::{Path, PathBuf};

use vcs_git::{SyncEngine, SyncSettings};

use crate::error::{CliError, Result};

/// Loaded settings plus the engine built from them.
pub struct SyncContext {
    pub settings: SyncSettings,
    pub engine: SyncEngine,
}

impl SyncContext {
    /// Load settings from `config`.
    pub fn load(config: &Path) -> Result<Self> {
        if !config.exists() {
            return Err(CliError::user(format!(
                "settings file {} not found (use --config or VCS_SYNC_CONFIG)",
                config.display()
            )));
        }
        let settings = SyncSettings::load(config)?;
        Self::from_settings(settings)
    }

    pub fn from_settings(settings: SyncSettings) -> Result<Self> {
        let engine = SyncEngine::from_settings(&settings)?;
        Ok(Self { settings, engine })
    }

    /// The configured working copy.
    pub fn working_copy(&self) -> Result<PathBuf> {
        self.settings
            .working_copy()?
            .ok_or_else(|| CliError::user("local_url is not configured"))
    }

    /// The configured remote URL.
    pub fn remote_url(&self) -> Result<&str> {
        self.settings
            .remote_url()
            .ok_or_else(|| CliError::user("remote_url is not configured"))
    }

    /// Revision from the command line, falling back to settings.
    pub fn revision<'a>(&'a self, cli: Option<&'a str>) -> Option<&'a str> {
        cli.filter(|r| !r.trim().is_empty())
            .or_else(|| self.settings.revision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_settings_file_is_user_error() {
        let temp = TempDir::new().unwrap();
        let err = SyncContext::load(&temp.path().join("absent.toml"))
            .err()
            .unwrap();
        assert!(matches!(err, CliError::User { .. }));
    }

    #[test]
    fn command_line_revision_wins() {
        let settings = SyncSettings {
            revision: Some("from-settings".into()),
            ..Default::default()
        };
        let context = SyncContext::from_settings(settings).unwrap();
        assert_eq!(context.revision(Some("v2")), Some("v2"));
        assert_eq!(context.revision(None), Some("from-settings"));
        assert!(context.working_copy().is_err());
        assert!(context.remote_url().is_err());
    }
}
