//! CLI argument parsing using clap derive

use std::path::PathBuf;

use aicm_core::Scope;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// AI Config Manager - keep one source of instructions in sync across AI agents
#[derive(Parser, Debug)]
#[command(name = "aicm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Home directory holding .ai-config-manager and the agent directories
    #[arg(long, global = true, env = "AICM_HOME")]
    pub home: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the workspace and default mapping
    ///
    /// When the source tree is empty, existing agent files are adopted as
    /// per-agent overlays so the first sync changes nothing.
    Init {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show agent directories and mapped target files
    Endpoints {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List files in a scope (source, codex, gemini, claude)
    Files {
        #[arg(default_value = "source", value_parser = parse_scope)]
        scope: Scope,
    },

    /// Print a file from a scope
    Cat {
        #[arg(value_parser = parse_scope)]
        scope: Scope,
        /// Path relative to the scope root
        path: String,
    },

    /// Write a file in a scope
    ///
    /// Content comes from --content, --from, or standard input.
    ///
    /// Examples:
    ///   aicm write source instructions/global.md --content "Be concise."
    ///   aicm write source mcp/servers.json --from ./servers.json
    ///   echo "Be concise." | aicm write source instructions/global.md
    Write {
        #[arg(value_parser = parse_scope)]
        scope: Scope,
        /// Path relative to the scope root
        path: String,
        /// Literal content to write
        #[arg(long, conflicts_with = "from")]
        content: Option<String>,
        /// Read content from this file
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Delete a file from a scope
    Rm {
        #[arg(value_parser = parse_scope)]
        scope: Scope,
        /// Path relative to the scope root
        path: String,
    },

    /// Show or replace the category mapping
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },

    /// Preview what a sync would change
    Preview {
        /// Show unified diffs for pending items
        #[arg(long)]
        diff: bool,
        /// Include unchanged items
        #[arg(long)]
        all: bool,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Apply selected sync items
    ///
    /// Examples:
    ///   aicm apply claude:global codex:global
    ///   aicm apply --all
    Apply {
        /// Item ids as shown by `aicm preview` (agent:category)
        #[arg(required_unless_present = "all")]
        ids: Vec<String>,
        /// Apply every pending item
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Manage backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Export the source tree and mapping as a share package
    Export {
        /// Redact secrets from exported files
        #[arg(long)]
        sanitize: bool,
        /// Destination zip (default: .ai-config-manager/exports/)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Import a share package into the source tree
    Import {
        /// Path to the share package
        zip: PathBuf,
        /// Show what would be imported without writing
        #[arg(long)]
        dry_run: bool,
        /// Replace existing files and the mapping
        #[arg(long)]
        overwrite: bool,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Mapping subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MappingAction {
    /// Print the current mapping as JSON
    Show,
    /// Validate and save a mapping from a JSON file
    Set {
        /// Mapping JSON file
        file: PathBuf,
    },
}

/// Backup subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// List backups, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the files in a backup next to their current content
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Snapshot all source files and mapped agent files
    Create {
        #[arg(long)]
        json: bool,
    },
    /// Return files to the state recorded in a backup
    Restore {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a backup
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_scope(value: &str) -> Result<Scope, String> {
    value.parse().map_err(|e: aicm_core::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_command() {
        let cli = Cli::parse_from(["aicm"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_home_after_subcommand() {
        let cli = Cli::parse_from(["aicm", "preview", "--home", "/tmp/h"]);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/h")));
    }

    #[test]
    fn parse_files_defaults_to_source() {
        let cli = Cli::parse_from(["aicm", "files"]);
        assert_eq!(
            cli.command,
            Some(Commands::Files {
                scope: Scope::Source
            })
        );
    }

    #[test]
    fn parse_unknown_scope_fails() {
        let result = Cli::try_parse_from(["aicm", "files", "cursor"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_apply_ids() {
        let cli = Cli::parse_from(["aicm", "apply", "codex:global", "claude:global"]);
        match cli.command {
            Some(Commands::Apply { ids, all, json }) => {
                assert_eq!(ids, vec!["codex:global", "claude:global"]);
                assert!(!all);
                assert!(!json);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_apply_requires_ids_or_all() {
        assert!(Cli::try_parse_from(["aicm", "apply"]).is_err());
        assert!(Cli::try_parse_from(["aicm", "apply", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["aicm", "apply", "--all", "codex:global"]).is_err());
    }

    #[test]
    fn parse_write_content_conflicts_with_from() {
        let result = Cli::try_parse_from([
            "aicm", "write", "source", "a.md", "--content", "x", "--from", "b.md",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_backup_restore_yes() {
        let cli = Cli::parse_from(["aicm", "backup", "restore", "20260101T000000000Z-000", "-y"]);
        assert_eq!(
            cli.command,
            Some(Commands::Backup {
                action: BackupAction::Restore {
                    id: "20260101T000000000Z-000".to_string(),
                    yes: true
                }
            })
        );
    }

    #[test]
    fn parse_import_flags() {
        let cli = Cli::parse_from(["aicm", "import", "share.zip", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Import {
                dry_run: true,
                overwrite: false,
                ..
            })
        ));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["aicm", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }
}
