//! Synchronization settings as read from the bootstrap configuration file.
//!
//! ```toml
//! local_url = "file:///opt/app/config"
//! remote_url = "git@example.com:ops/config.git?branch=release"
//! revision = "v1.4.0"
//! clean_update = false
//!
//! [auth]
//! ssh_key_file = "/home/app/.ssh/id_ed25519"
//! ssh_passphrase = "%env{APP_SSH_PASSPHRASE}"
//!
//! [auth.proxy]
//! host = "proxy.internal:3128"
//! type = "HTTP"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use vcs_fs::{ConfigStore, NormalizedPath, location_to_path};

use crate::Result;

/// Top-level settings for one working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Working copy location (path or `file://` URL).
    pub local_url: Option<String>,

    /// Remote repository URL, optionally annotated with `?branch=<name>`.
    pub remote_url: Option<String>,

    /// Branch, tag, or commit id to track. Absent tracks the current branch.
    pub revision: Option<String>,

    /// Hard-reset the working copy before every update.
    pub clean_update: bool,

    pub auth: AuthSettings,

    /// Identity used for commits made by the engine.
    pub committer: Option<CommitterSettings>,
}

impl SyncSettings {
    /// Load settings from a TOML, JSON or YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(ConfigStore::new().load(&NormalizedPath::new(path))?)
    }

    /// Resolved working copy path, if configured.
    pub fn working_copy(&self) -> Result<Option<PathBuf>> {
        match self.local_url.as_deref() {
            Some(location) => Ok(Some(location_to_path(location)?)),
            None => Ok(None),
        }
    }

    /// Configured revision, ignoring blank values.
    pub fn revision(&self) -> Option<&str> {
        non_blank(self.revision.as_deref())
    }

    pub fn remote_url(&self) -> Option<&str> {
        non_blank(self.remote_url.as_deref())
    }
}

/// Authentication inputs. Secret fields hold the raw, undecoded value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Explicit strategy name; inferred from the remote URL when absent.
    pub strategy: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssh_key_file: Option<String>,
    pub ssh_passphrase: Option<String>,
    pub proxy: Option<ProxySettings>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("strategy", &self.strategy)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssh_key_file", &self.ssh_key_file)
            .field("ssh_passphrase", &self.ssh_passphrase.as_ref().map(|_| "***"))
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Proxy used to tunnel SSH sessions.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// `host` or `host:port`.
    pub host: String,
    /// `HTTP` (default), `SOCKS4` or `SOCKS5`.
    #[serde(rename = "type")]
    pub proxy_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("host", &self.host)
            .field("proxy_type", &self.proxy_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitterSettings {
    pub name: String,
    pub email: String,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_toml() {
        let settings: SyncSettings = toml::from_str(
            r#"
            local_url = "/srv/config"
            remote_url = "ssh://git@example.com/ops.git"
            revision = "release"
            clean_update = true

            [auth]
            strategy = "SSHKey"
            ssh_key_file = "/keys/id"
            ssh_passphrase = "secret"

            [auth.proxy]
            host = "proxy:1080"
            type = "socks5"

            [committer]
            name = "Deploy Bot"
            email = "deploy@example.com"
            "#,
        )
        .unwrap();

        assert!(settings.working_copy().unwrap().is_some());
        assert!(settings.remote_url().is_some());
        assert!(settings.clean_update);
        assert_eq!(settings.revision(), Some("release"));
        assert_eq!(settings.auth.strategy.as_deref(), Some("SSHKey"));
        let proxy = settings.auth.proxy.clone().unwrap();
        assert_eq!(proxy.proxy_type.as_deref(), Some("socks5"));
        assert_eq!(settings.committer.unwrap().name, "Deploy Bot");
    }

    #[test]
    fn empty_document_is_unconfigured() {
        let settings: SyncSettings = toml::from_str("").unwrap();
        assert_eq!(settings.remote_url(), None);
        assert!(!settings.clean_update);
        assert_eq!(settings.working_copy().unwrap(), None);
    }

    #[test]
    fn blank_revision_is_ignored() {
        let settings = SyncSettings {
            revision: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(settings.revision(), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = AuthSettings {
            username: Some("deploy".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let text = format!("{auth:?}");
        assert!(text.contains("deploy"));
        assert!(!text.contains("hunter2"));
    }
}
