//! vcs-sync CLI
//!
//! Drives the synchronization engine from a settings file.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::SyncContext;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let context = SyncContext::load(&cli.config)?;
    execute_command(cli.command, context)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(verbose);
    let result = if verbose {
        tracing::subscriber::set_global_default(builder.with_max_level(Level::DEBUG).finish())
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish())
    };
    result.map_err(|e| CliError::user(format!("failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Verbose mode enabled");
    Ok(())
}

fn execute_command(cmd: Commands, context: SyncContext) -> Result<()> {
    match cmd {
        Commands::Bootstrap { checkout } => commands::run_bootstrap(context, checkout),
        Commands::Checkout { revision } => commands::run_checkout(&context, revision.as_deref()),
        Commands::Update { revision, clean } => {
            commands::run_update(&context, revision.as_deref(), clean)
        }
        Commands::Commit { message, files } => commands::run_commit(&context, &message, &files),
        Commands::Add => commands::run_add(&context),
        Commands::Status { json } => commands::run_status(&context, json),
        Commands::Log { limit, json } => commands::run_log(&context, limit, json),
        Commands::TestConnection => commands::run_test_connection(&context),
    }
}
