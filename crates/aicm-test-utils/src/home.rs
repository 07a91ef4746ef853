//! [`TestHome`] builder for workspace test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Name of the app directory inside a home
pub const APP_DIR: &str = ".ai-config-manager";

/// A temporary home directory with helpers for seeding source and agent
/// files and asserting on the results.
///
/// Agents are addressed by name (`"codex"`, `"gemini"`, `"claude"`) and
/// live in `<home>/.<name>`.
///
/// # Example
///
/// ```rust,no_run
/// use aicm_test_utils::TestHome;
///
/// let home = TestHome::new();
/// home.write_source("instructions/global.md", "Be concise.");
/// home.write_agent("claude", "CLAUDE.md", "existing");
/// home.assert_file_contains(".claude/CLAUDE.md", "existing");
/// ```
pub struct TestHome {
    temp_dir: TempDir,
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the temporary home directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn app_root(&self) -> PathBuf {
        self.path().join(APP_DIR)
    }

    pub fn source_path(&self, relative: &str) -> PathBuf {
        self.app_root().join("source").join(relative)
    }

    pub fn agent_path(&self, agent: &str, relative: &str) -> PathBuf {
        self.path().join(format!(".{agent}")).join(relative)
    }

    /// Write a file under the source scope, creating parents.
    pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.source_path(relative);
        write_with_parents(&path, content.as_bytes());
        path
    }

    /// Write a file under an agent's directory, creating parents.
    pub fn write_agent(&self, agent: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.agent_path(agent, relative);
        write_with_parents(&path, content.as_bytes());
        path
    }

    /// Write `mapping.json` verbatim.
    pub fn write_mapping(&self, json: &str) {
        write_with_parents(&self.app_root().join("mapping.json"), json.as_bytes());
    }

    /// Write `settings.toml` verbatim.
    pub fn write_settings(&self, toml: &str) {
        write_with_parents(&self.app_root().join("settings.toml"), toml.as_bytes());
    }

    pub fn read_source(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.source_path(relative)).ok()
    }

    pub fn read_agent(&self, agent: &str, relative: &str) -> Option<String> {
        fs::read_to_string(self.agent_path(agent, relative)).ok()
    }

    /// Assert that `path` (relative to the home) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the home) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to the home) contains `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read_home_file(path);
        assert!(
            file_content.contains(content),
            "File {path} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }

    /// Assert that the file at `path` (relative to the home) equals `content`.
    pub fn assert_file_eq(&self, path: &str, content: &str) {
        let file_content = self.read_home_file(path);
        assert_eq!(file_content, content, "Unexpected content in {path}");
    }

    fn read_home_file(&self, path: &str) -> String {
        let full_path = self.path().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }
}

fn write_with_parents(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
