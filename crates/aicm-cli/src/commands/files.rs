//! Scope file commands: files, cat, write, rm

use std::io::Read;
use std::path::Path;

use colored::Colorize;

use aicm_core::{Scope, Workspace};

use crate::error::Result;

/// Run the files command
pub fn run_files(workspace: &Workspace, scope: Scope) -> Result<()> {
    let listing = workspace.list_scope_files(scope)?;
    println!("{} ({})", scope.to_string().bold(), listing.base_path.dimmed());
    if listing.files.is_empty() {
        println!("   {}", "(empty)".dimmed());
    }
    for file in &listing.files {
        println!("   {}", file);
    }
    Ok(())
}

/// Run the cat command
pub fn run_cat(workspace: &Workspace, scope: Scope, path: &str) -> Result<()> {
    let file = workspace.read_scope_file(scope, path)?;
    print!("{}", file.content);
    Ok(())
}

/// Run the write command
///
/// Content precedence: `--content`, then `--from`, then stdin.
pub fn run_write(
    workspace: &Workspace,
    scope: Scope,
    path: &str,
    content: Option<String>,
    from: Option<&Path>,
) -> Result<()> {
    let content = match (content, from) {
        (Some(content), _) => content,
        (None, Some(from)) => std::fs::read_to_string(from)?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    workspace.save_scope_file(scope, path, &content)?;
    println!("{} Wrote {}/{}", "OK".green().bold(), scope, path.cyan());
    Ok(())
}

/// Run the rm command
pub fn run_rm(workspace: &Workspace, scope: Scope, path: &str) -> Result<()> {
    workspace.delete_scope_file(scope, path)?;
    println!("{} Deleted {}/{}", "OK".green().bold(), scope, path.cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicm_test_utils::TestHome;

    #[test]
    fn test_write_then_cat_and_rm() {
        let home = TestHome::new();
        let workspace = Workspace::open(home.path()).unwrap();

        run_write(
            &workspace,
            Scope::Source,
            "instructions/global.md",
            Some("Be concise.".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            home.read_source("instructions/global.md").as_deref(),
            Some("Be concise.")
        );
        assert!(run_cat(&workspace, Scope::Source, "instructions/global.md").is_ok());

        run_rm(&workspace, Scope::Source, "instructions/global.md").unwrap();
        assert!(run_cat(&workspace, Scope::Source, "instructions/global.md").is_err());
    }

    #[test]
    fn test_write_from_file() {
        let home = TestHome::new();
        let workspace = Workspace::open(home.path()).unwrap();
        let input = home.path().join("input.json");
        std::fs::write(&input, "{}").unwrap();

        run_write(&workspace, Scope::Source, "mcp/servers.json", None, Some(&input)).unwrap();

        assert_eq!(home.read_source("mcp/servers.json").as_deref(), Some("{}"));
    }
}
