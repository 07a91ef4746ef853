//! Writing a selection of preview items to agent files

use std::collections::HashSet;

use aicm_fs::{NormalizedPath, RobustnessConfig, io};
use serde::{Deserialize, Serialize};

use super::{SyncItem, SyncPreview};
use crate::backup::{BackupStore, BackupTrigger, SnapshotTarget};
use crate::layout::WorkspaceLayout;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySyncResult {
    /// Backup holding the pre-images; `None` when nothing was written
    pub backup_id: Option<String>,
    pub applied_count: usize,
    /// Target relative paths written, in preview order
    pub files: Vec<String>,
}

type WriteFn = fn(&NormalizedPath, &[u8], RobustnessConfig) -> aicm_fs::Result<()>;

/// Applies selected items of a freshly computed preview.
pub struct SyncApplier<'a> {
    layout: &'a WorkspaceLayout,
    store: &'a BackupStore,
    robustness: RobustnessConfig,
    write: WriteFn,
}

impl<'a> SyncApplier<'a> {
    pub fn new(
        layout: &'a WorkspaceLayout,
        store: &'a BackupStore,
        robustness: RobustnessConfig,
    ) -> Self {
        Self {
            layout,
            store,
            robustness,
            write: io::write_atomic,
        }
    }

    #[cfg(test)]
    fn with_writer(mut self, write: WriteFn) -> Self {
        self.write = write;
        self
    }

    /// Write the selected items that are still pending in `preview`.
    ///
    /// Ids missing from `preview` fail the whole call before anything is
    /// written. Selected items that are now `unchanged` are dropped. When at
    /// least one item remains, one backup of every target about to be
    /// written is taken first.
    pub fn apply(&self, preview: &SyncPreview, selected_ids: &[String]) -> Result<ApplySyncResult> {
        let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();

        let mut unknown: Vec<String> = selected
            .iter()
            .filter(|id| preview.get(id).is_none())
            .map(|id| id.to_string())
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(Error::StaleSelection { ids: unknown });
        }

        let chosen: Vec<&SyncItem> = preview
            .items
            .iter()
            .filter(|item| selected.contains(item.id.as_str()))
            .filter(|item| {
                let pending = item.is_pending();
                if !pending {
                    tracing::debug!(id = %item.id, "Skipping selected item, now unchanged");
                }
                pending
            })
            .collect();

        if chosen.is_empty() {
            tracing::debug!("Nothing to apply");
            return Ok(ApplySyncResult::default());
        }

        let targets: Vec<SnapshotTarget> = chosen
            .iter()
            .map(|item| {
                SnapshotTarget::new(
                    item.agent.into(),
                    item.target_relative_path.clone(),
                    self.target_path(item),
                )
            })
            .collect();
        let backup = self.store.create(BackupTrigger::Sync, &targets)?;

        let mut files = Vec::with_capacity(chosen.len());
        for item in &chosen {
            let path = self.target_path(item);
            if let Err(err) = (self.write)(&path, item.after.as_bytes(), self.robustness) {
                return Err(Error::PartialApply {
                    backup_id: Some(backup.backup_id),
                    failed: item.target_relative_path.to_string(),
                    succeeded: files,
                    source: Box::new(err.into()),
                });
            }
            tracing::debug!(id = %item.id, path = %path, "Wrote sync target");
            files.push(item.target_relative_path.to_string());
        }

        tracing::info!(
            backup_id = %backup.backup_id,
            applied = files.len(),
            "Applied sync"
        );
        Ok(ApplySyncResult {
            backup_id: Some(backup.backup_id),
            applied_count: files.len(),
            files,
        })
    }

    fn target_path(&self, item: &SyncItem) -> NormalizedPath {
        self.layout
            .agent_root(item.agent)
            .join_relative(&item.target_relative_path)
    }
}
