//! Optional `settings.toml`
//!
//! ```toml
//! [agents]
//! codex = "/opt/codex"          # absolute, or relative to home
//!
//! [sanitize]
//! builtin = true
//! patterns = ["internal\\.example\\.com"]
//! replacement = "[REDACTED]"
//!
//! [locking]
//! timeout_ms = 5000
//! ```
//!
//! A missing file means defaults everywhere.

use std::path::PathBuf;
use std::time::Duration;

use aicm_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::layout::WorkspaceLayout;
use crate::package::sanitize::Sanitizer;
use crate::scope::Agent;
use crate::{Error, Result};

pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub agents: AgentRoots,
    pub sanitize: SanitizeSettings,
    pub locking: LockSettings,
}

/// Per-agent root directory overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRoots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codex: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude: Option<PathBuf>,
}

impl AgentRoots {
    pub fn get(&self, agent: Agent) -> Option<&PathBuf> {
        match agent {
            Agent::Codex => self.codex.as_ref(),
            Agent::Gemini => self.gemini.as_ref(),
            Agent::Claude => self.claude.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeSettings {
    /// Apply the built-in secret rules
    pub builtin: bool,
    /// Extra regular expressions whose matches are redacted
    pub patterns: Vec<String>,
    pub replacement: String,
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        Self {
            builtin: true,
            patterns: Vec::new(),
            replacement: DEFAULT_REPLACEMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub timeout_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl LockSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Load and validate settings for `layout`; defaults when the file is absent.
    pub fn load(layout: &WorkspaceLayout) -> Result<Self> {
        let path = layout.settings_path();
        let settings: Settings = match ConfigStore::new().load_optional(&path) {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(aicm_fs::Error::ConfigParse { message, .. }) => {
                return Err(Error::invalid_config("Settings", vec![message]));
            }
            Err(err) => return Err(err.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Collect every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.locking.timeout_ms == 0 {
            problems.push("locking.timeout_ms must be greater than zero".to_string());
        }
        if let Err(Error::InvalidConfig { problems: bad, .. }) =
            Sanitizer::from_settings(&self.sanitize)
        {
            problems.extend(bad);
        }
        for agent in Agent::ALL {
            if let Some(root) = self.agents.get(agent)
                && root.as_os_str().is_empty()
            {
                problems.push(format!("agents.{agent} must not be empty"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_config("Settings", problems))
        }
    }

    /// Apply agent root overrides to a layout.
    pub fn apply_to(&self, mut layout: WorkspaceLayout) -> WorkspaceLayout {
        for agent in Agent::ALL {
            if let Some(root) = self.agents.get(agent) {
                layout = layout.with_agent_root(agent, root);
            }
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn layout_with(content: Option<&str>) -> (tempfile::TempDir, WorkspaceLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        if let Some(content) = content {
            std::fs::create_dir_all(layout.app_root().to_native()).unwrap();
            std::fs::write(layout.settings_path().to_native(), content).unwrap();
        }
        (dir, layout)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let (_dir, layout) = layout_with(None);
        let settings = Settings::load(&layout).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.sanitize.builtin);
        assert_eq!(settings.sanitize.replacement, "[REDACTED]");
        assert_eq!(settings.locking.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, layout) = layout_with(Some("[locking]\ntimeout_ms = 250\n"));
        let settings = Settings::load(&layout).unwrap();
        assert_eq!(settings.locking.timeout_ms, 250);
        assert!(settings.sanitize.builtin);
    }

    #[test]
    fn bad_patterns_are_all_reported() {
        let (_dir, layout) = layout_with(Some(
            "[sanitize]\npatterns = [\"(unclosed\", \"[bad\"]\n\n[locking]\ntimeout_ms = 0\n",
        ));
        let err = Settings::load(&layout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        match err {
            Error::InvalidConfig { problems, .. } => assert_eq!(problems.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_toml_is_invalid_config() {
        let (_dir, layout) = layout_with(Some("[locking\n"));
        let err = Settings::load(&layout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn agent_overrides_apply_to_layout() {
        let (dir, layout) = layout_with(Some("[agents]\nclaude = \"alt/claude\"\n"));
        let settings = Settings::load(&layout).unwrap();
        let layout = settings.apply_to(layout);
        assert_eq!(
            layout.agent_root(Agent::Claude).to_native(),
            dir.path().join("alt/claude")
        );
    }
}
