//! Command implementations for vcs-cli

pub mod commit;
pub mod status;
pub mod sync;

pub use commit::{run_add, run_commit};
pub use status::{run_log, run_status};
pub use sync::{run_bootstrap, run_checkout, run_test_connection, run_update};
