//! Sync preview and apply
//!
//! A preview is recomputed from disk on every call and never persisted. Apply
//! recomputes it again under the workspace lock, so ids the caller selected
//! from an older preview are checked against current state.

pub mod append;
mod apply;
mod preview;

use std::fmt;

use aicm_fs::RelativePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::scope::Agent;

pub use apply::{ApplySyncResult, SyncApplier};
pub use preview::{ComposedSource, PreviewEngine, plan_content};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Create,
    Update,
    Unchanged,
    Append,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Unchanged => "unchanged",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned transfer from the source scope into an agent file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// `<agent>:<category>`, stable across previews
    pub id: String,
    pub agent: Agent,
    pub category: String,
    pub source_file: String,
    pub target_relative_path: RelativePath,
    pub target_absolute_path: String,
    pub status: SyncStatus,
    /// Current target content, empty when the target is absent
    pub before: String,
    /// Target content after apply
    pub after: String,
}

impl SyncItem {
    pub fn item_id(agent: Agent, category: &str) -> String {
        format!("{agent}:{category}")
    }

    /// Would applying this item write anything?
    pub fn is_pending(&self) -> bool {
        self.status != SyncStatus::Unchanged
    }

    /// `before` to `after` as a unified diff with three lines of context.
    pub fn unified_diff(&self) -> String {
        let old_label = format!("a/{}/{}", self.agent, self.target_relative_path);
        let new_label = format!("b/{}/{}", self.agent, self.target_relative_path);
        TextDiff::from_lines(&self.before, &self.after)
            .unified_diff()
            .context_radius(3)
            .header(&old_label, &new_label)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPreview {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<SyncItem>,
}

impl SyncPreview {
    pub fn get(&self, id: &str) -> Option<&SyncItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &SyncItem> {
        self.items.iter().filter(|item| item.is_pending())
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.pending().map(|item| item.id.clone()).collect()
    }
}
