//! Checkout, update and bootstrap commands

use colored::Colorize;
use vcs_fs::io::display_path;
use vcs_git::{Bootstrap, VersionControl};

use crate::context::SyncContext;
use crate::error::Result;

/// Run the bootstrap sequence configured in settings.
pub fn run_bootstrap(context: SyncContext, fresh_checkout: bool) -> Result<()> {
    let bootstrap = Bootstrap::new(context.settings, context.engine);
    let revision = if fresh_checkout {
        bootstrap.checkout()?
    } else {
        bootstrap.update()?
    };

    match revision {
        Some(revision) => println!("{} At revision {}", "OK".green().bold(), revision.cyan()),
        None => println!(
            "{} Repository not configured, nothing to do",
            "--".yellow().bold()
        ),
    }
    Ok(())
}

/// Create the working copy.
pub fn run_checkout(context: &SyncContext, revision: Option<&str>) -> Result<()> {
    let working_copy = context.working_copy()?;
    let remote_url = context.remote_url()?;

    println!(
        "{} Checking out {} into {}...",
        "=>".blue().bold(),
        remote_url.yellow(),
        working_copy.display()
    );

    let revision = match context.revision(revision) {
        Some(revision) => context
            .engine
            .checkout_revision(remote_url, &working_copy, revision)?,
        None => context.engine.checkout(remote_url, &working_copy)?,
    };

    println!("{} Checked out {}", "OK".green().bold(), revision.cyan());
    Ok(())
}

/// Update the working copy.
pub fn run_update(context: &SyncContext, revision: Option<&str>, clean: bool) -> Result<()> {
    let working_copy = context.working_copy()?;
    let engine = if clean {
        context.engine.clone().with_clean_update(true)
    } else {
        context.engine.clone()
    };

    println!(
        "{} Updating {}...",
        "=>".blue().bold(),
        display_path(&working_copy).display()
    );

    let revision = match context.revision(revision) {
        Some(revision) => engine.update_revision(&working_copy, revision)?,
        None => engine.update(&working_copy)?,
    };

    println!("{} Up to date at {}", "OK".green().bold(), revision.cyan());
    Ok(())
}

/// Check that the remote answers.
pub fn run_test_connection(context: &SyncContext) -> Result<()> {
    let remote_url = context.remote_url()?;
    println!(
        "{} Connecting to {} ({})...",
        "=>".blue().bold(),
        remote_url.yellow(),
        context.engine.auth()
    );

    match context.engine.test_connection(remote_url)? {
        Some(head) => println!("{} Remote HEAD is {}", "OK".green().bold(), head.cyan()),
        None => println!("{} Remote reachable, no HEAD advertised", "OK".green().bold()),
    }
    Ok(())
}
