//! On-disk layout of a workspace
//!
//! ```text
//! <home>/
//! ├── .ai-config-manager/
//! │   ├── source/            # authored content
//! │   ├── backups/<id>/      # manifest.json + files/<root>/<path>
//! │   ├── exports/           # generated share packages
//! │   ├── mapping.json
//! │   ├── settings.toml
//! │   └── .workspace.lock
//! ├── .codex/
//! ├── .gemini/
//! └── .claude/
//! ```

use std::path::{Path, PathBuf};

use aicm_fs::NormalizedPath;

use crate::scope::{Agent, Scope};
use crate::{Error, Result};

pub const APP_DIR_NAME: &str = ".ai-config-manager";
pub const SOURCE_DIR: &str = "source";
pub const BACKUPS_DIR: &str = "backups";
pub const EXPORTS_DIR: &str = "exports";
pub const MAPPING_FILE: &str = "mapping.json";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const LOCK_FILE: &str = ".workspace.lock";

/// Environment variable that overrides the home directory.
pub const HOME_ENV: &str = "AICM_HOME";

/// Resolved locations for one home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    home: NormalizedPath,
    app_root: NormalizedPath,
    agent_roots: [NormalizedPath; 3],
}

impl WorkspaceLayout {
    pub fn new(home: impl AsRef<Path>) -> Self {
        let home = NormalizedPath::new(home);
        let app_root = home.join(APP_DIR_NAME);
        let agent_roots = Agent::ALL.map(|agent| home.join(agent.dir_name()));
        Self {
            home,
            app_root,
            agent_roots,
        }
    }

    /// Resolve the home directory: explicit argument, then `AICM_HOME`,
    /// then the user's home directory.
    pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(home) = explicit {
            return Ok(home);
        }
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(home));
        }
        dirs::home_dir().ok_or_else(|| Error::not_found("home directory"))
    }

    /// Point an agent at a different config directory. Relative paths are
    /// taken relative to the home directory.
    pub fn with_agent_root(mut self, agent: Agent, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let resolved = if root.is_absolute() {
            NormalizedPath::new(root)
        } else {
            self.home.join(&root.to_string_lossy())
        };
        self.agent_roots[Self::slot(agent)] = resolved;
        self
    }

    pub fn home(&self) -> &NormalizedPath {
        &self.home
    }

    pub fn app_root(&self) -> &NormalizedPath {
        &self.app_root
    }

    pub fn source_root(&self) -> NormalizedPath {
        self.app_root.join(SOURCE_DIR)
    }

    pub fn backups_root(&self) -> NormalizedPath {
        self.app_root.join(BACKUPS_DIR)
    }

    pub fn exports_root(&self) -> NormalizedPath {
        self.app_root.join(EXPORTS_DIR)
    }

    pub fn mapping_path(&self) -> NormalizedPath {
        self.app_root.join(MAPPING_FILE)
    }

    pub fn settings_path(&self) -> NormalizedPath {
        self.app_root.join(SETTINGS_FILE)
    }

    pub fn lock_path(&self) -> NormalizedPath {
        self.app_root.join(LOCK_FILE)
    }

    pub fn agent_root(&self, agent: Agent) -> &NormalizedPath {
        &self.agent_roots[Self::slot(agent)]
    }

    pub fn scope_root(&self, scope: Scope) -> NormalizedPath {
        match scope.agent() {
            Some(agent) => self.agent_root(agent).clone(),
            None => self.source_root(),
        }
    }

    fn slot(agent: Agent) -> usize {
        match agent {
            Agent::Codex => 0,
            Agent::Gemini => 1,
            Agent::Claude => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roots_live_under_home() {
        let layout = WorkspaceLayout::new("/home/dev");
        assert_eq!(layout.app_root().as_str(), "/home/dev/.ai-config-manager");
        assert_eq!(
            layout.source_root().as_str(),
            "/home/dev/.ai-config-manager/source"
        );
        assert_eq!(
            layout.mapping_path().as_str(),
            "/home/dev/.ai-config-manager/mapping.json"
        );
        assert_eq!(layout.agent_root(Agent::Gemini).as_str(), "/home/dev/.gemini");
        assert_eq!(layout.scope_root(Scope::Claude).as_str(), "/home/dev/.claude");
    }

    #[test]
    fn agent_root_override() {
        let layout = WorkspaceLayout::new("/home/dev")
            .with_agent_root(Agent::Codex, "/opt/codex")
            .with_agent_root(Agent::Claude, "configs/claude");
        assert_eq!(layout.agent_root(Agent::Codex).as_str(), "/opt/codex");
        assert_eq!(
            layout.agent_root(Agent::Claude).as_str(),
            "/home/dev/configs/claude"
        );
        assert_eq!(layout.agent_root(Agent::Gemini).as_str(), "/home/dev/.gemini");
    }

    #[test]
    fn explicit_home_wins() {
        let home = WorkspaceLayout::resolve_home(Some(PathBuf::from("/tmp/explicit"))).unwrap();
        assert_eq!(home, PathBuf::from("/tmp/explicit"));
    }
}
