//! Preview and apply command implementations

use colored::{ColoredString, Colorize};

use aicm_core::{SyncItem, SyncStatus, Workspace};

use super::print_json;
use crate::error::Result;

fn status_label(status: SyncStatus) -> ColoredString {
    match status {
        SyncStatus::Create => "create".green(),
        SyncStatus::Update => "update".yellow(),
        SyncStatus::Append => "append".blue(),
        SyncStatus::Unchanged => "unchanged".dimmed(),
    }
}

/// Run the preview command
///
/// Never writes. Unchanged items are hidden unless `all` is set.
pub fn run_preview(workspace: &Workspace, diff: bool, all: bool, json: bool) -> Result<()> {
    let preview = workspace.preview_sync()?;
    if json {
        return print_json(&preview);
    }

    let shown: Vec<&SyncItem> = preview
        .items
        .iter()
        .filter(|item| all || item.is_pending())
        .collect();
    let pending = preview.pending().count();

    if pending == 0 {
        println!(
            "{} No changes needed. Agents are in sync.",
            "OK".green().bold()
        );
    } else {
        println!("{}", "Changes that would be made:".bold());
    }

    for item in shown {
        println!(
            "   {:<10} {:<16} {} {} {}",
            status_label(item.status),
            item.id.cyan(),
            item.source_file,
            "->".dimmed(),
            item.target_absolute_path
        );
        if diff && item.is_pending() {
            for line in item.unified_diff().lines() {
                let colored = if line.starts_with("+++") || line.starts_with("---") {
                    line.bold()
                } else if line.starts_with('+') {
                    line.green()
                } else if line.starts_with('-') {
                    line.red()
                } else if line.starts_with("@@") {
                    line.cyan()
                } else {
                    line.normal()
                };
                println!("      {}", colored);
            }
        }
    }

    if pending > 0 {
        println!();
        println!(
            "Run {} or {} to apply.",
            "aicm apply <id>...".cyan(),
            "aicm apply --all".cyan()
        );
    }
    Ok(())
}

/// Run the apply command
///
/// With `all`, selects every item the current preview reports as pending.
/// The engine recomputes the preview under the workspace lock either way.
pub fn run_apply(workspace: &Workspace, ids: Vec<String>, all: bool, json: bool) -> Result<()> {
    let ids = if all {
        workspace.preview_sync()?.pending_ids()
    } else {
        ids
    };
    tracing::debug!(?ids, "Applying sync selection");

    let result = workspace.apply_sync(&ids)?;
    if json {
        return print_json(&result);
    }

    if result.applied_count == 0 {
        println!(
            "{} Already synchronized. No changes needed.",
            "OK".green().bold()
        );
        return Ok(());
    }

    println!(
        "{} Applied {} item(s):",
        "OK".green().bold(),
        result.applied_count
    );
    for file in &result.files {
        println!("   {} {}", "+".green(), file);
    }
    if let Some(backup_id) = &result.backup_id {
        println!();
        println!(
            "Backup {} holds the previous content. Undo with {}.",
            backup_id.cyan(),
            format!("aicm backup restore {backup_id}").cyan()
        );
    }
    Ok(())
}
