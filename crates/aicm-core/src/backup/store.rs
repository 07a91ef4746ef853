//! Append-only backup directory
//!
//! ```text
//! backups/
//! └── 20260301T101500123Z-000/
//!     ├── manifest.json
//!     └── files/<root>/<relative path>
//! ```
//!
//! The manifest is written last, so a directory without one is an interrupted
//! backup and is never listed.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;

use aicm_fs::checksum::{compute_checksum, verify_checksum};
use aicm_fs::{ConfigStore, NormalizedPath, RelativePath, RobustnessConfig, io, validate_identifier};
use chrono::{DateTime, Utc};

use super::{
    BackupDetail, BackupEntry, BackupInfo, BackupManifest, BackupRoot, BackupTrigger,
    MANIFEST_FILE, ManifestEntry, PAYLOAD_DIR,
};
use crate::{Error, Result};

/// Timestamp part of a backup id; fixed width so ids sort chronologically
const ID_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

/// Disambiguators tried for backups created within the same millisecond
const MAX_ID_SEQUENCE: u32 = 1000;

/// A file to snapshot: where it lives and how to record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTarget {
    pub root: BackupRoot,
    pub relative: RelativePath,
    pub absolute: NormalizedPath,
}

impl SnapshotTarget {
    pub fn new(root: BackupRoot, relative: RelativePath, absolute: NormalizedPath) -> Self {
        Self {
            root,
            relative,
            absolute,
        }
    }
}

/// Creates, reads and deletes backups under one directory
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: NormalizedPath,
    robustness: RobustnessConfig,
}

impl BackupStore {
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Snapshot the current bytes of every target into a new backup.
    ///
    /// Absent targets are recorded with `existed_before = false`. Repeated
    /// targets are recorded once. On failure the half-written backup
    /// directory is removed.
    pub fn create(
        &self,
        trigger: BackupTrigger,
        targets: &[SnapshotTarget],
    ) -> Result<BackupManifest> {
        fs::create_dir_all(self.root.to_native())
            .map_err(|e| aicm_fs::Error::io(self.root.to_native(), e))?;

        let (backup_id, created_at, dir) = self.allocate()?;
        let result = self.write_snapshot(&dir, backup_id, created_at, trigger, targets);
        if result.is_err() {
            let _ = fs::remove_dir_all(dir.to_native());
        }
        result
    }

    /// All readable backups, newest first.
    ///
    /// Directories whose manifest is missing or unreadable are skipped.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        let entries = match fs::read_dir(self.root.to_native()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(aicm_fs::Error::io(self.root.to_native(), e).into()),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| aicm_fs::Error::io(self.root.to_native(), e))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            let manifest_path = self.root.join(&id).join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                tracing::debug!(backup_id = %id, "Skipping backup without manifest");
                continue;
            }
            match self.load(&id) {
                Ok(manifest) => backups.push(BackupInfo::from(&manifest)),
                Err(err) => {
                    tracing::warn!(backup_id = %id, error = %err, "Skipping unreadable backup");
                }
            }
        }

        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.backup_id.cmp(&a.backup_id))
        });
        Ok(backups)
    }

    /// Load a backup's manifest.
    pub fn load(&self, backup_id: &str) -> Result<BackupManifest> {
        let dir = self.backup_dir(backup_id)?;
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(Error::not_found(format!("backup {backup_id}")));
        }

        let manifest: BackupManifest = ConfigStore::new()
            .load(&manifest_path)
            .map_err(|e| Error::CorruptBackup {
                backup_id: backup_id.to_string(),
                detail: e.to_string(),
            })?;

        if manifest.backup_id != backup_id {
            return Err(Error::CorruptBackup {
                backup_id: backup_id.to_string(),
                detail: format!("manifest names backup {}", manifest.backup_id),
            });
        }
        Ok(manifest)
    }

    /// Stored pre-image of `entry`, verified against its checksum.
    ///
    /// `None` when the file did not exist before the operation.
    pub fn payload(&self, manifest: &BackupManifest, entry: &ManifestEntry) -> Result<Option<Vec<u8>>> {
        if !entry.existed_before {
            return Ok(None);
        }

        let dir = self.backup_dir(&manifest.backup_id)?;
        let path = payload_path(&dir, entry.agent, &entry.target_relative_path);
        let corrupt = |detail: String| Error::CorruptBackup {
            backup_id: manifest.backup_id.clone(),
            detail,
        };

        let bytes = io::read_bytes_optional(&path)?.ok_or_else(|| {
            corrupt(format!(
                "missing stored copy of {}/{}",
                entry.agent, entry.target_relative_path
            ))
        })?;

        if let Some(expected) = &entry.checksum
            && !verify_checksum(&bytes, expected)
        {
            return Err(corrupt(format!(
                "checksum mismatch for {}/{}",
                entry.agent, entry.target_relative_path
            )));
        }
        Ok(Some(bytes))
    }

    /// Stored pre-images paired with current live content.
    pub fn detail(&self, backup_id: &str) -> Result<BackupDetail> {
        let manifest = self.load(backup_id)?;
        let mut entries = Vec::with_capacity(manifest.entries.len());
        for entry in &manifest.entries {
            let backup_content = self
                .payload(&manifest, entry)?
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
            let current_content =
                io::read_text_optional(&NormalizedPath::new(&entry.target_absolute_path))?;
            entries.push(BackupEntry {
                agent: entry.agent,
                target_relative_path: entry.target_relative_path.clone(),
                target_absolute_path: entry.target_absolute_path.clone(),
                existed_before: entry.existed_before,
                backup_content,
                current_content,
            });
        }

        Ok(BackupDetail {
            backup_id: manifest.backup_id,
            created_at: manifest.created_at,
            trigger: manifest.trigger,
            entries,
        })
    }

    /// Remove a backup and everything it stores.
    pub fn delete(&self, backup_id: &str) -> Result<()> {
        let dir = self.backup_dir(backup_id)?;
        if !dir.is_dir() {
            return Err(Error::not_found(format!("backup {backup_id}")));
        }
        fs::remove_dir_all(dir.to_native()).map_err(|e| aicm_fs::Error::io(dir.to_native(), e))?;
        tracing::info!(backup_id, "Deleted backup");
        Ok(())
    }

    fn backup_dir(&self, backup_id: &str) -> Result<NormalizedPath> {
        validate_identifier(backup_id, "backup id")
            .map_err(|_| Error::not_found(format!("backup {backup_id}")))?;
        Ok(self.root.join(backup_id))
    }

    /// Claim a fresh backup directory. `create_dir` fails if another
    /// writer took the same id, so ids never collide.
    fn allocate(&self) -> Result<(String, DateTime<Utc>, NormalizedPath)> {
        let created_at = Utc::now();
        let stamp = created_at.format(ID_TIMESTAMP_FORMAT).to_string();

        for sequence in 0..MAX_ID_SEQUENCE {
            let backup_id = format!("{stamp}-{sequence:03}");
            let dir = self.root.join(&backup_id);
            match fs::create_dir(dir.to_native()) {
                Ok(()) => return Ok((backup_id, created_at, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(aicm_fs::Error::io(dir.to_native(), e).into()),
            }
        }

        Err(Error::Io(std::io::Error::other(format!(
            "no free backup id for {stamp}"
        ))))
    }

    fn write_snapshot(
        &self,
        dir: &NormalizedPath,
        backup_id: String,
        created_at: DateTime<Utc>,
        trigger: BackupTrigger,
        targets: &[SnapshotTarget],
    ) -> Result<BackupManifest> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(targets.len());

        for target in targets {
            if !seen.insert((target.root, target.relative.clone())) {
                continue;
            }

            let current = io::read_bytes_optional(&target.absolute)?;
            let checksum = match &current {
                Some(bytes) => {
                    let path = payload_path(dir, target.root, &target.relative);
                    io::write_atomic(&path, bytes, self.robustness)?;
                    Some(compute_checksum(bytes))
                }
                None => None,
            };

            tracing::debug!(
                backup_id = %backup_id,
                root = %target.root,
                path = %target.relative,
                existed = current.is_some(),
                "Captured pre-image"
            );
            entries.push(ManifestEntry {
                agent: target.root,
                target_relative_path: target.relative.clone(),
                target_absolute_path: target.absolute.to_string(),
                existed_before: current.is_some(),
                checksum,
            });
        }

        let manifest = BackupManifest {
            backup_id,
            created_at,
            trigger,
            entries,
        };
        ConfigStore::with_robustness(self.robustness).save(&dir.join(MANIFEST_FILE), &manifest)?;

        tracing::info!(
            backup_id = %manifest.backup_id,
            trigger = %trigger,
            entries = manifest.entries.len(),
            "Created backup"
        );
        Ok(manifest)
    }
}

fn payload_path(dir: &NormalizedPath, root: BackupRoot, relative: &RelativePath) -> NormalizedPath {
    dir.join(PAYLOAD_DIR).join(root.as_str()).join_relative(relative)
}
