//! Command implementations for aicm-cli

pub mod backup;
pub mod files;
pub mod init;
pub mod mapping;
pub mod package;
pub mod sync;

use std::io::IsTerminal;

use clap::CommandFactory;
use clap_complete::Shell;
use serde::Serialize;

use crate::cli::Cli;
use crate::error::{CliError, Result};

pub use backup::{
    run_backup_create, run_backup_delete, run_backup_list, run_backup_restore, run_backup_show,
};
pub use files::{run_cat, run_files, run_rm, run_write};
pub use init::{run_endpoints, run_init};
pub use mapping::{run_mapping_set, run_mapping_show};
pub use package::{run_export, run_import};
pub use sync::{run_apply, run_preview};

/// Run the completions command
pub fn run_completions(shell: Shell) -> Result<()> {
    clap_complete::generate(shell, &mut Cli::command(), "aicm", &mut std::io::stdout());
    Ok(())
}

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask before a destructive action unless `--yes` was given.
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub(crate) fn confirm(prompt: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::user(format!(
            "{prompt} Refusing without confirmation; pass --yes."
        )));
    }
    let proceed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if proceed {
        Ok(())
    } else {
        Err(CliError::user("Cancelled by user."))
    }
}
