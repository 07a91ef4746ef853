//! Init and endpoints command implementations

use colored::Colorize;

use aicm_core::Workspace;

use super::print_json;
use crate::error::Result;

/// Run the init command
pub fn run_init(workspace: &Workspace, json: bool) -> Result<()> {
    let info = workspace.init_workspace()?;
    if json {
        return print_json(&info);
    }

    println!(
        "{} Workspace initialized at {}",
        "OK".green().bold(),
        info.app_root.cyan()
    );
    if info.mapping_created {
        println!("   {} {}", "+".green(), "default mapping written".dimmed());
    }
    println!("{}:", "Categories".bold());
    for category in &info.categories {
        println!("   {}", category.cyan());
    }
    if !info.bootstrapped.is_empty() {
        println!("{}:", "Adopted existing agent files".bold());
        for path in &info.bootstrapped {
            println!("   {} {}", "+".green(), path);
        }
    }
    println!();
    println!("Run {} to see what a sync would do.", "aicm preview".cyan());
    Ok(())
}

/// Run the endpoints command
pub fn run_endpoints(workspace: &Workspace, json: bool) -> Result<()> {
    let endpoints = workspace.get_agent_endpoints()?;
    if json {
        return print_json(&endpoints);
    }

    let mut current = None;
    for endpoint in &endpoints {
        if current != Some(endpoint.agent) {
            println!("{}:", endpoint.agent.to_string().bold());
            current = Some(endpoint.agent);
        }
        let marker = if endpoint.exists {
            "+".green()
        } else {
            "-".dimmed()
        };
        println!("   {} {:<10} {}", marker, endpoint.kind.cyan(), endpoint.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicm_test_utils::TestHome;

    #[test]
    fn test_init_in_empty_home() {
        let home = TestHome::new();
        let workspace = Workspace::open(home.path()).unwrap();

        run_init(&workspace, false).unwrap();

        home.assert_file_exists(".ai-config-manager/mapping.json");
    }

    #[test]
    fn test_endpoints_json() {
        let home = TestHome::new();
        let workspace = Workspace::open(home.path()).unwrap();
        assert!(run_endpoints(&workspace, true).is_ok());
    }
}
