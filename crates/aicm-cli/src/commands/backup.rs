//! Backup command implementations

use colored::Colorize;

use aicm_core::{BackupEntry, Workspace};

use super::{confirm, print_json};
use crate::error::Result;

/// Run the backup list command
pub fn run_backup_list(workspace: &Workspace, json: bool) -> Result<()> {
    let backups = workspace.list_backups()?;
    if json {
        return print_json(&backups);
    }

    if backups.is_empty() {
        println!("{}", "No backups yet.".dimmed());
        return Ok(());
    }
    println!("{}", "Backups (newest first)".bold());
    for info in &backups {
        println!(
            "   {}  {:<7} {} file(s)  {}",
            info.backup_id.cyan(),
            info.trigger.to_string(),
            info.entry_count,
            info.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }
    Ok(())
}

fn entry_state(entry: &BackupEntry) -> colored::ColoredString {
    match (&entry.backup_content, &entry.current_content) {
        (None, None) => "absent".dimmed(),
        (None, Some(_)) => "created since".yellow(),
        (Some(_), None) => "deleted since".red(),
        (Some(stored), Some(current)) if stored == current => "unchanged".green(),
        (Some(_), Some(_)) => "modified since".yellow(),
    }
}

/// Run the backup show command
pub fn run_backup_show(workspace: &Workspace, id: &str, json: bool) -> Result<()> {
    let detail = workspace.get_backup_detail(id)?;
    if json {
        return print_json(&detail);
    }

    println!(
        "{} {} ({}, {})",
        "Backup".bold(),
        detail.backup_id.cyan(),
        detail.trigger,
        detail.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for entry in &detail.entries {
        println!(
            "   {:<9} {:<40} {}",
            entry.agent.to_string(),
            entry.target_relative_path.to_string(),
            entry_state(entry)
        );
    }
    Ok(())
}

/// Run the backup create command
pub fn run_backup_create(workspace: &Workspace, json: bool) -> Result<()> {
    let info = workspace.create_backup()?;
    if json {
        return print_json(&info);
    }
    println!(
        "{} Created backup {} with {} file(s)",
        "OK".green().bold(),
        info.backup_id.cyan(),
        info.entry_count
    );
    Ok(())
}

/// Run the backup restore command
pub fn run_backup_restore(workspace: &Workspace, id: &str, yes: bool) -> Result<()> {
    // Fail on unknown or corrupt backups before prompting.
    workspace.get_backup_detail(id)?;
    confirm(&format!("Restore files from backup {id}?"), yes)?;

    let result = workspace.restore_backup(id)?;
    if result.restored_count == 0 {
        println!(
            "{} Files already match backup {}.",
            "OK".green().bold(),
            id.cyan()
        );
    } else {
        println!(
            "{} Restored {} file(s) from {}",
            "OK".green().bold(),
            result.restored_count,
            id.cyan()
        );
    }
    Ok(())
}

/// Run the backup delete command
pub fn run_backup_delete(workspace: &Workspace, id: &str, yes: bool) -> Result<()> {
    confirm(&format!("Delete backup {id}?"), yes)?;
    workspace.delete_backup(id)?;
    println!("{} Deleted backup {}", "OK".green().bold(), id.cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicm_test_utils::TestHome;

    #[test]
    fn test_create_restore_delete() {
        let home = TestHome::new();
        home.write_agent("claude", "CLAUDE.md", "original");
        let workspace = Workspace::open(home.path()).unwrap();

        run_backup_create(&workspace, false).unwrap();
        let id = workspace.list_backups().unwrap()[0].backup_id.clone();
        home.write_agent("claude", "CLAUDE.md", "edited");

        run_backup_show(&workspace, &id, false).unwrap();
        run_backup_restore(&workspace, &id, true).unwrap();
        home.assert_file_eq(".claude/CLAUDE.md", "original");

        run_backup_delete(&workspace, &id, true).unwrap();
        assert!(workspace.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_restore_unknown_backup_fails_before_prompt() {
        let home = TestHome::new();
        let workspace = Workspace::open(home.path()).unwrap();
        let err = run_backup_restore(&workspace, "20200101T000000000Z-000", false).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
