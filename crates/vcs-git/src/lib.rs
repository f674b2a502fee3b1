//! Git working-copy synchronization for vcs-sync
//!
//! Keeps a local working copy in step with a remote repository through a bare
//! shadow cache kept beside it, and publishes local commits back upstream.

pub mod auth;
pub mod bootstrap;
pub mod conflict;
pub mod engine;
pub mod error;
mod helpers;
pub mod history;
pub mod provider;
pub mod revision;
pub mod secret;
pub mod settings;
pub mod shadow;
pub mod state;
mod transport;

pub use auth::{
    AuthStrategy, AuthenticationContext, AuthenticationResolver, ProxyConfig, ProxyType,
};
pub use bootstrap::Bootstrap;
pub use conflict::{ConflictHandler, PushOutcome, PushVerdict, RefUpdate};
pub use engine::SyncEngine;
pub use error::{Error, ErrorKind, Result};
pub use helpers::{DEFAULT_COMMITTER_EMAIL, DEFAULT_COMMITTER_NAME};
pub use history::RevisionHistoryEntry;
pub use provider::VersionControl;
pub use revision::{ResolvedRef, RevisionResolver};
pub use secret::{DefaultSecretResolver, Secret, SecretResolver};
pub use settings::{AuthSettings, CommitterSettings, ProxySettings, SyncSettings};
pub use shadow::{RemoteUrl, ShadowRepositoryCache};
pub use state::SyncState;
