//! Restore live files to a backup's recorded state

use aicm_fs::{NormalizedPath, RobustnessConfig, io};
use serde::{Deserialize, Serialize};

use super::BackupStore;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResult {
    /// Entries whose live state actually changed
    pub restored_count: usize,
}

/// Applies a backup's pre-images to the live files.
pub struct RestoreEngine<'a> {
    store: &'a BackupStore,
    robustness: RobustnessConfig,
}

impl<'a> RestoreEngine<'a> {
    pub fn new(store: &'a BackupStore, robustness: RobustnessConfig) -> Self {
        Self { store, robustness }
    }

    /// Put every entry of `backup_id` back the way it was.
    ///
    /// All stored pre-images are verified before any live file is touched.
    /// Entries already in the desired state are left alone and not counted.
    pub fn restore(&self, backup_id: &str) -> Result<RestoreResult> {
        let manifest = self.store.load(backup_id)?;

        let mut plan = Vec::with_capacity(manifest.entries.len());
        for entry in &manifest.entries {
            let desired = self.store.payload(&manifest, entry)?;
            plan.push((NormalizedPath::new(&entry.target_absolute_path), desired));
        }

        let mut restored = Vec::new();
        for (path, desired) in &plan {
            let outcome = self.restore_one(path, desired.as_deref());
            match outcome {
                Ok(true) => {
                    tracing::debug!(backup_id, path = %path, "Restored file");
                    restored.push(path.to_string());
                }
                Ok(false) => {}
                Err(source) => {
                    return Err(Error::PartialRestore {
                        backup_id: backup_id.to_string(),
                        failed: path.to_string(),
                        restored,
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(backup_id, restored = restored.len(), "Restored backup");
        Ok(RestoreResult {
            restored_count: restored.len(),
        })
    }

    /// Bring one file to `desired` (`None` = absent). Returns whether it changed.
    fn restore_one(&self, path: &NormalizedPath, desired: Option<&[u8]>) -> Result<bool> {
        let current = io::read_bytes_optional(path)?;
        if current.as_deref() == desired {
            return Ok(false);
        }
        match desired {
            Some(bytes) => io::write_atomic(path, bytes, self.robustness)?,
            None => {
                io::remove_file(path)?;
            }
        }
        Ok(true)
    }
}
