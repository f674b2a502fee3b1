//! Filesystem helpers for vcs-sync
//!
//! Path normalisation, working-copy location parsing, and format-agnostic
//! configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{NormalizedPath, location_to_path, to_unix_path};
