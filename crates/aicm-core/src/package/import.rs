//! Reading share packages into the source scope

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use aicm_fs::{RelativePath, RobustnessConfig, io};
use zip::ZipArchive;

use super::{
    ARCHIVE_MAPPING, ARCHIVE_METADATA, ARCHIVE_SOURCE_DIR, ImportFilePreview, ImportFileStatus,
    ImportPreview, ImportResult, PACKAGE_FORMAT, PackageMetadata,
};
use crate::backup::{BackupRoot, BackupStore, BackupTrigger, SnapshotTarget};
use crate::layout::{MAPPING_FILE, WorkspaceLayout};
use crate::mapping::MappingConfig;
use crate::{Error, Result};

/// What an archive entry is, judged by its name alone.
enum EntryKind {
    Source(RelativePath),
    Mapping,
    Metadata,
    Ignored,
}

/// Everything an archive carries, validated and in memory.
#[derive(Debug, Clone)]
pub struct PackageContents {
    /// Source files, sorted by path
    pub files: Vec<(RelativePath, Vec<u8>)>,
    pub mapping: Option<MappingConfig>,
    pub metadata: Option<PackageMetadata>,
}

/// Read and validate every entry of a share package.
pub fn read_package(path: &Path) -> Result<PackageContents> {
    let mut archive = open_archive(path)?;
    let mut files = Vec::new();
    let mut mapping = None;
    let mut metadata = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|source| Error::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.is_dir() {
            continue;
        }
        let kind = classify(path, entry.name(), entry.enclosed_name().is_some())?;
        if matches!(kind, EntryKind::Ignored) {
            tracing::debug!(entry = entry.name(), "Ignoring archive entry");
            continue;
        }

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| aicm_fs::Error::io(path, e))?;

        match kind {
            EntryKind::Source(relative) => files.push((relative, bytes)),
            EntryKind::Mapping => {
                mapping = Some(MappingConfig::from_json(&String::from_utf8_lossy(&bytes))?);
            }
            EntryKind::Metadata => metadata = Some(parse_metadata(path, &bytes)?),
            EntryKind::Ignored => {}
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = files.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(Error::invalid_package(
            path,
            format!("duplicate entry for source/{}", pair[0].0),
        ));
    }

    Ok(PackageContents {
        files,
        mapping,
        metadata,
    })
}

/// Previews and applies share packages against one workspace.
pub struct PackageImporter<'a> {
    layout: &'a WorkspaceLayout,
    store: &'a BackupStore,
    robustness: RobustnessConfig,
}

impl<'a> PackageImporter<'a> {
    pub fn new(
        layout: &'a WorkspaceLayout,
        store: &'a BackupStore,
        robustness: RobustnessConfig,
    ) -> Self {
        Self {
            layout,
            store,
            robustness,
        }
    }

    /// Classify each archived source file as create or overwrite.
    ///
    /// Reads entry names and `package.json` only; nothing is extracted.
    pub fn preview(&self, zip_path: &Path) -> Result<ImportPreview> {
        let mut archive = open_archive(zip_path)?;
        let source_root = self.layout.source_root();
        let mut files = Vec::new();
        let mut has_mapping = false;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|source| Error::Archive {
                path: zip_path.to_path_buf(),
                source,
            })?;
            if entry.is_dir() {
                continue;
            }
            match classify(zip_path, entry.name(), entry.enclosed_name().is_some())? {
                EntryKind::Source(relative) => {
                    let status = if source_root.join_relative(&relative).exists() {
                        ImportFileStatus::Overwrite
                    } else {
                        ImportFileStatus::Create
                    };
                    files.push(ImportFilePreview {
                        relative_path: relative.to_string(),
                        status,
                    });
                }
                EntryKind::Mapping => has_mapping = true,
                EntryKind::Metadata => {
                    let mut bytes = Vec::new();
                    entry
                        .read_to_end(&mut bytes)
                        .map_err(|e| aicm_fs::Error::io(zip_path, e))?;
                    parse_metadata(zip_path, &bytes)?;
                }
                EntryKind::Ignored => {}
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(ImportPreview {
            zip_path: zip_path.display().to_string(),
            files,
            has_mapping,
        })
    }

    /// Write archived files into the source scope.
    ///
    /// Colliding files are skipped unless `overwrite`. Files about to be
    /// overwritten, and `mapping.json` when it will be replaced, are backed
    /// up first in one `import` backup. The archived mapping is applied when
    /// `overwrite` is set or the workspace has none yet.
    pub fn apply(&self, zip_path: &Path, overwrite: bool) -> Result<ImportResult> {
        let contents = read_package(zip_path)?;
        let source_root = self.layout.source_root();
        let mapping_path = self.layout.mapping_path();

        let mut staged = Vec::new();
        let mut skipped_count = 0;
        let mut backup_targets = Vec::new();

        for (relative, bytes) in &contents.files {
            let dest = source_root.join_relative(relative);
            let collides = dest.exists();
            if collides && !overwrite {
                tracing::debug!(path = %relative, "Skipping existing file");
                skipped_count += 1;
                continue;
            }
            if collides {
                backup_targets.push(SnapshotTarget::new(
                    BackupRoot::Source,
                    relative.clone(),
                    dest.clone(),
                ));
            }
            staged.push((relative, dest, bytes));
        }

        let mapping = contents
            .mapping
            .as_ref()
            .filter(|_| overwrite || !mapping_path.exists());
        if mapping.is_some() && mapping_path.exists() {
            backup_targets.push(SnapshotTarget::new(
                BackupRoot::Workspace,
                RelativePath::parse(MAPPING_FILE)?,
                mapping_path.clone(),
            ));
        }

        let backup_id = if backup_targets.is_empty() {
            None
        } else {
            Some(self.store.create(BackupTrigger::Import, &backup_targets)?.backup_id)
        };

        let mut written = Vec::with_capacity(staged.len());
        for (relative, dest, bytes) in &staged {
            if let Err(err) = io::write_atomic(dest, bytes, self.robustness) {
                return Err(partial(backup_id, relative.to_string(), written, err.into()));
            }
            tracing::debug!(path = %relative, "Imported file");
            written.push(relative.to_string());
        }

        if let Some(mapping) = mapping {
            let write = mapping.to_json().and_then(|json| {
                io::write_atomic(&mapping_path, json.as_bytes(), self.robustness)
                    .map_err(Error::from)
            });
            if let Err(err) = write {
                return Err(partial(backup_id, MAPPING_FILE.to_string(), written, err));
            }
        }

        let result = ImportResult {
            backup_id,
            applied_count: written.len(),
            skipped_count,
            mapping_applied: mapping.is_some(),
        };
        tracing::info!(
            package = %zip_path.display(),
            applied = result.applied_count,
            skipped = result.skipped_count,
            mapping_applied = result.mapping_applied,
            "Imported share package"
        );
        Ok(result)
    }
}

fn partial(backup_id: Option<String>, failed: String, written: Vec<String>, source: Error) -> Error {
    Error::PartialImport {
        backup_id,
        failed,
        written,
        source: Box::new(source),
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::not_found(format!("share package {}", path.display())),
        _ => aicm_fs::Error::io(path, e).into(),
    })?;
    ZipArchive::new(file)
        .map_err(|e| Error::invalid_package(path, format!("not a readable zip archive: {e}")))
}

fn classify(archive: &Path, name: &str, enclosed: bool) -> Result<EntryKind> {
    let unsafe_entry = || Error::invalid_package(archive, format!("unsafe entry path '{name}'"));
    if !enclosed {
        return Err(unsafe_entry());
    }
    let relative = RelativePath::parse(name).map_err(|_| unsafe_entry())?;

    Ok(match relative.as_str() {
        ARCHIVE_MAPPING => EntryKind::Mapping,
        ARCHIVE_METADATA => EntryKind::Metadata,
        _ => match relative.strip_dir(ARCHIVE_SOURCE_DIR) {
            Some(inner) => EntryKind::Source(inner),
            None => EntryKind::Ignored,
        },
    })
}

fn parse_metadata(archive: &Path, bytes: &[u8]) -> Result<PackageMetadata> {
    let metadata: PackageMetadata = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_package(archive, format!("unreadable {ARCHIVE_METADATA}: {e}")))?;
    if metadata.format > PACKAGE_FORMAT {
        return Err(Error::invalid_package(
            archive,
            format!(
                "package format {} is newer than supported format {PACKAGE_FORMAT}",
                metadata.format
            ),
        ));
    }
    Ok(metadata)
}
