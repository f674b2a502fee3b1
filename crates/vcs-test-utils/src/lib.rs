//! Shared test utilities for the vcs-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: [`RemoteFixture`], a bare remote with scripted history
//! - [`workspace`]: [`TestWorkspace`] for working-copy assertions

pub mod git;
pub mod workspace;

pub use git::RemoteFixture;
pub use workspace::TestWorkspace;
