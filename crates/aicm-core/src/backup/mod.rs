//! Backup store and restore
//!
//! Every mutating operation snapshots the files it is about to touch into
//! `backups/<backup_id>/`. Snapshots are full copies, so deleting one backup
//! never affects another.

mod restore;
mod store;

use std::fmt;

use aicm_fs::RelativePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::{Agent, Scope};

pub use restore::{RestoreEngine, RestoreResult};
pub use store::{BackupStore, SnapshotTarget};

/// File name of the manifest inside each backup directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Directory holding stored pre-images inside each backup directory
pub const PAYLOAD_DIR: &str = "files";

/// Operation that created a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupTrigger {
    Sync,
    Import,
    Manual,
}

impl fmt::Display for BackupTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "sync",
            Self::Import => "import",
            Self::Manual => "manual",
        })
    }
}

/// Root a backed-up file is relative to.
///
/// The scope roots plus `workspace`, the app directory holding `mapping.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupRoot {
    Source,
    Codex,
    Gemini,
    Claude,
    Workspace,
}

impl BackupRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Workspace => "workspace",
        }
    }
}

impl fmt::Display for BackupRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Scope> for BackupRoot {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Source => Self::Source,
            Scope::Codex => Self::Codex,
            Scope::Gemini => Self::Gemini,
            Scope::Claude => Self::Claude,
        }
    }
}

impl From<Agent> for BackupRoot {
    fn from(agent: Agent) -> Self {
        Scope::from(agent).into()
    }
}

/// One file recorded in a backup manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Root the path is relative to
    pub agent: BackupRoot,
    pub target_relative_path: RelativePath,
    /// Where the file lived when the backup was taken; restore writes here
    pub target_absolute_path: String,
    /// Did the file exist before the operation?
    pub existed_before: bool,
    /// `sha256:<hex>` of the stored pre-image, present iff `existed_before`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub backup_id: String,
    pub created_at: DateTime<Utc>,
    pub trigger: BackupTrigger,
    pub entries: Vec<ManifestEntry>,
}

/// Summary row for backup listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub backup_id: String,
    pub created_at: DateTime<Utc>,
    pub trigger: BackupTrigger,
    pub entry_count: usize,
}

impl From<&BackupManifest> for BackupInfo {
    fn from(manifest: &BackupManifest) -> Self {
        Self {
            backup_id: manifest.backup_id.clone(),
            created_at: manifest.created_at,
            trigger: manifest.trigger,
            entry_count: manifest.entries.len(),
        }
    }
}

/// A backed-up file paired with what is on disk now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub agent: BackupRoot,
    pub target_relative_path: RelativePath,
    pub target_absolute_path: String,
    pub existed_before: bool,
    /// Stored pre-image; `None` iff `existed_before` is false
    pub backup_content: Option<String>,
    /// Current live content; `None` when the file is absent
    pub current_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDetail {
    pub backup_id: String,
    pub created_at: DateTime<Utc>,
    pub trigger: BackupTrigger,
    pub entries: Vec<BackupEntry>,
}
