//! Status and log commands

use colored::Colorize;
use vcs_git::{SyncState, VersionControl};

use crate::context::SyncContext;
use crate::error::Result;

/// Show where the working copy and the remote stand.
pub fn run_status(context: &SyncContext, json: bool) -> Result<()> {
    let working_copy = context.working_copy()?;
    let state = SyncState::detect(&working_copy)?;

    if !state.has_working_copy() {
        if json {
            let output = serde_json::json!({
                "path": working_copy.display().to_string(),
                "state": format!("{state:?}"),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", "No working copy".red().bold());
            println!();
            println!("Run {} to create it.", "vcs-sync checkout".cyan());
        }
        return Ok(());
    }

    let local = context.engine.local_revision(&working_copy)?;
    let remote = context.engine.remote_revision(&working_copy)?;
    let behind = local != remote;

    if json {
        let output = serde_json::json!({
            "path": working_copy.display().to_string(),
            "state": format!("{state:?}"),
            "local_revision": local,
            "remote_revision": remote,
            "behind": behind,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Working Copy Status".bold());
    println!();
    println!("{}:    {}", "Path".dimmed(), working_copy.display());
    println!("{}:   {:?}", "State".dimmed(), state);
    println!("{}:   {}", "Local".dimmed(), local.cyan());
    let remote_status = if behind {
        "behind".yellow()
    } else {
        "up to date".green()
    };
    println!("{}:  {} ({})", "Remote".dimmed(), remote.cyan(), remote_status);
    Ok(())
}

/// Show up to `limit` history entries.
pub fn run_log(context: &SyncContext, limit: usize, json: bool) -> Result<()> {
    let working_copy = context.working_copy()?;
    let entries = context.engine.revision_history(&working_copy, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let summary = entry.message.lines().next().unwrap_or("");
        println!(
            "{} {} {} {}",
            format!("{:.7}", entry.revision).yellow(),
            entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.author.cyan(),
            summary
        );
    }
    Ok(())
}
