//! AI Config Manager CLI
//!
//! Front end for the sync engine: edit scope files, preview and apply syncs,
//! manage backups and move share packages between machines.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use aicm_core::Workspace;
use cli::{BackupAction, Cli, Commands, MappingAction};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("{}: {}", "hint".yellow().bold(), hint);
        }
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(home = ?cli.home, "Starting aicm");

    let Some(command) = cli.command else {
        println!("{} AI Config Manager", "aicm".green().bold());
        println!();
        println!("Run {} for available commands.", "aicm --help".cyan());
        return Ok(());
    };

    // Completions must work even where no workspace can be opened.
    if let Commands::Completions { shell } = command {
        return commands::run_completions(shell);
    }

    let workspace = Workspace::discover(cli.home)?;
    execute_command(&workspace, command)
}

fn execute_command(workspace: &Workspace, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { json } => commands::run_init(workspace, json),
        Commands::Endpoints { json } => commands::run_endpoints(workspace, json),
        Commands::Files { scope } => commands::run_files(workspace, scope),
        Commands::Cat { scope, path } => commands::run_cat(workspace, scope, &path),
        Commands::Write {
            scope,
            path,
            content,
            from,
        } => commands::run_write(workspace, scope, &path, content, from.as_deref()),
        Commands::Rm { scope, path } => commands::run_rm(workspace, scope, &path),
        Commands::Mapping { action } => match action {
            MappingAction::Show => commands::run_mapping_show(workspace),
            MappingAction::Set { file } => commands::run_mapping_set(workspace, &file),
        },
        Commands::Preview { diff, all, json } => commands::run_preview(workspace, diff, all, json),
        Commands::Apply { ids, all, json } => commands::run_apply(workspace, ids, all, json),
        Commands::Backup { action } => match action {
            BackupAction::List { json } => commands::run_backup_list(workspace, json),
            BackupAction::Show { id, json } => commands::run_backup_show(workspace, &id, json),
            BackupAction::Create { json } => commands::run_backup_create(workspace, json),
            BackupAction::Restore { id, yes } => commands::run_backup_restore(workspace, &id, yes),
            BackupAction::Delete { id, yes } => commands::run_backup_delete(workspace, &id, yes),
        },
        Commands::Export {
            sanitize,
            output,
            json,
        } => commands::run_export(workspace, sanitize, output.as_deref(), json),
        Commands::Import {
            zip,
            dry_run,
            overwrite,
            json,
        } => commands::run_import(workspace, &zip, dry_run, overwrite, json),
        Commands::Completions { shell } => commands::run_completions(shell),
    }
}
