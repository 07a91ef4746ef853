//! Mapping command implementations

use std::path::Path;

use colored::Colorize;

use aicm_core::{MappingConfig, Workspace};

use crate::error::Result;

/// Run the mapping show command
pub fn run_mapping_show(workspace: &Workspace) -> Result<()> {
    let mapping = workspace.get_mapping()?;
    print!("{}", mapping.to_json()?);
    Ok(())
}

/// Run the mapping set command
///
/// The file is validated as a whole before anything is saved.
pub fn run_mapping_set(workspace: &Workspace, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let mapping = MappingConfig::from_json(&content)?;
    workspace.save_mapping(&mapping)?;

    println!(
        "{} Saved mapping with {} categor{}",
        "OK".green().bold(),
        mapping.category_names().len(),
        if mapping.category_names().len() == 1 { "y" } else { "ies" }
    );
    for (name, category) in mapping.categories() {
        let agents: Vec<String> = category
            .targeted_agents()
            .map(|agent| agent.to_string())
            .collect();
        println!(
            "   {} {} -> {} ({})",
            "+".green(),
            name.cyan(),
            agents.join(", "),
            category.sync_mode.to_string().dimmed()
        );
    }
    Ok(())
}
