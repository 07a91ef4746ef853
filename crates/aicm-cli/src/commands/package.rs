//! Share package export and import commands

use std::path::Path;

use colored::Colorize;

use aicm_core::{ImportFileStatus, Workspace};

use super::print_json;
use crate::error::Result;

/// Run the export command
pub fn run_export(
    workspace: &Workspace,
    sanitize: bool,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let result = match output {
        Some(path) => workspace.export_share_package_to(path, sanitize)?,
        None => workspace.export_share_package(sanitize)?,
    };
    if json {
        return print_json(&result);
    }

    println!(
        "{} Exported {} file(s) to {}",
        "OK".green().bold(),
        result.files,
        result.path.cyan()
    );
    if result.sanitized {
        println!("   {} secret(s) redacted", result.redactions);
    }
    Ok(())
}

/// Run the import command
///
/// `dry_run` only classifies archive entries; nothing is written.
pub fn run_import(
    workspace: &Workspace,
    zip: &Path,
    dry_run: bool,
    overwrite: bool,
    json: bool,
) -> Result<()> {
    if dry_run {
        let preview = workspace.preview_import_package(zip)?;
        if json {
            return print_json(&preview);
        }

        println!("{} {}", "Import preview".bold(), preview.zip_path.cyan());
        for file in &preview.files {
            let label = match (file.status, overwrite) {
                (ImportFileStatus::Create, _) => "create".green(),
                (ImportFileStatus::Overwrite, true) => "overwrite".yellow(),
                (ImportFileStatus::Overwrite, false) => "skip".dimmed(),
            };
            println!("   {:<9} {}", label, file.relative_path);
        }
        if preview.has_mapping {
            println!("   {}", "package includes a mapping".dimmed());
        }
        return Ok(());
    }

    let result = workspace.apply_import_package(zip, overwrite)?;
    if json {
        return print_json(&result);
    }

    println!(
        "{} Imported {} file(s), skipped {}",
        "OK".green().bold(),
        result.applied_count,
        result.skipped_count
    );
    if result.mapping_applied {
        println!("   {} mapping replaced", "+".green());
    }
    if result.skipped_count > 0 {
        println!(
            "   Existing files were kept. Use {} to replace them.",
            "--overwrite".cyan()
        );
    }
    if let Some(backup_id) = &result.backup_id {
        println!(
            "   Backup {} holds the overwritten files.",
            backup_id.cyan()
        );
    }
    Ok(())
}
