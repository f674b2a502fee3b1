//! Commit and add commands

use colored::Colorize;
use vcs_git::VersionControl;

use crate::context::SyncContext;
use crate::error::Result;

/// Commit and publish; with `files`, only those are added first.
pub fn run_commit(context: &SyncContext, message: &str, files: &[String]) -> Result<()> {
    let working_copy = context.working_copy()?;

    let revision = if files.is_empty() {
        Some(context.engine.commit(&working_copy, message)?)
    } else {
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        context
            .engine
            .add_and_commit(&working_copy, message, &files)?
    };

    match revision {
        Some(revision) => println!("{} Published {}", "OK".green().bold(), revision.cyan()),
        None => println!("{} Nothing to commit", "--".yellow().bold()),
    }
    Ok(())
}

/// Stage everything in the working copy.
pub fn run_add(context: &SyncContext) -> Result<()> {
    let working_copy = context.working_copy()?;
    context.engine.recursive_add(&working_copy)?;
    println!("{} Staged all changes", "OK".green().bold());
    Ok(())
}
