//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vcs-sync - Keep a working copy in sync with a remote git repository
#[derive(Parser, Debug)]
#[command(name = "vcs-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (TOML, JSON or YAML)
    #[arg(
        short,
        long,
        global = true,
        env = "VCS_SYNC_CONFIG",
        default_value = "vcs-sync.toml"
    )]
    pub config: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check out the working copy if missing, then update it
    Bootstrap {
        /// Always perform a fresh checkout
        #[arg(long)]
        checkout: bool,
    },

    /// Create the working copy from the remote
    Checkout {
        /// Branch, tag or commit to check out (overrides settings)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Pull remote changes into the working copy
    Update {
        /// Branch, tag or commit to update to (overrides settings)
        #[arg(short, long)]
        revision: Option<String>,

        /// Discard local changes before updating
        #[arg(long)]
        clean: bool,
    },

    /// Commit and publish local changes
    ///
    /// Without files, commits every modified tracked file.
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Files to add before committing
        files: Vec<String>,
    },

    /// Stage every change in the working copy
    Add,

    /// Show local and remote revisions
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show revision history, remote-only commits first
    Log {
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check that the remote is reachable with the configured credentials
    TestConnection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_commit_with_files() {
        let cli = Cli::parse_from(["vcs-sync", "commit", "-m", "msg", "a.txt", "b.txt"]);
        assert_eq!(
            cli.command,
            Commands::Commit {
                message: "msg".into(),
                files: vec!["a.txt".into(), "b.txt".into()],
            }
        );
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["vcs-sync", "update", "--clean", "-c", "other.yaml"]);
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        assert_eq!(
            cli.command,
            Commands::Update {
                revision: None,
                clean: true
            }
        );
    }

    #[test]
    fn log_limit_defaults_to_ten() {
        let cli = Cli::parse_from(["vcs-sync", "log"]);
        assert_eq!(
            cli.command,
            Commands::Log {
                limit: 10,
                json: false
            }
        );
    }
}
