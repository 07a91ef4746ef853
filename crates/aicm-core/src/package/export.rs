//! Writing share packages

use std::fs::{self, File};
use std::io::Write;

use aicm_fs::{NormalizedPath, io};
use chrono::Utc;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::sanitize::Sanitizer;
use super::{
    ARCHIVE_MAPPING, ARCHIVE_METADATA, ARCHIVE_SOURCE_DIR, ExportResult, PACKAGE_FORMAT,
    PackageMetadata,
};
use crate::layout::WorkspaceLayout;
use crate::mapping::MappingConfig;
use crate::{Error, Result};

/// Bundles the source scope and mapping into a zip archive.
pub struct PackageExporter<'a> {
    layout: &'a WorkspaceLayout,
    mapping: &'a MappingConfig,
    sanitizer: Option<&'a Sanitizer>,
}

impl<'a> PackageExporter<'a> {
    pub fn new(layout: &'a WorkspaceLayout, mapping: &'a MappingConfig) -> Self {
        Self {
            layout,
            mapping,
            sanitizer: None,
        }
    }

    /// Redact secrets from UTF-8 files on the way into the archive.
    pub fn sanitize_with(mut self, sanitizer: &'a Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Default destination: `exports/aicm-share-<timestamp>.zip`.
    pub fn default_destination(&self) -> NormalizedPath {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        self.layout
            .exports_root()
            .join(&format!("aicm-share-{stamp}.zip"))
    }

    /// Write the archive to `dest`, replacing any existing file.
    ///
    /// The archive is assembled next to `dest` and renamed into place, so an
    /// interrupted export never leaves a truncated zip at `dest`.
    pub fn export_to(&self, dest: &NormalizedPath) -> Result<ExportResult> {
        let native = dest.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| aicm_fs::Error::io(parent, e))?;
        }

        let partial = native.with_file_name(format!(
            ".{}.{}.partial",
            dest.file_name().unwrap_or("package.zip"),
            std::process::id()
        ));

        let result = self
            .write_archive(&NormalizedPath::new(&partial), dest)
            .and_then(|summary| {
                fs::rename(&partial, &native).map_err(|e| aicm_fs::Error::io(&native, e))?;
                Ok(summary)
            });
        if result.is_err() {
            let _ = fs::remove_file(&partial);
        }

        let summary = result?;
        tracing::info!(
            path = %dest,
            files = summary.files,
            sanitized = summary.sanitized,
            redactions = summary.redactions,
            "Exported share package"
        );
        Ok(summary)
    }

    fn write_archive(&self, path: &NormalizedPath, dest: &NormalizedPath) -> Result<ExportResult> {
        let native = path.to_native();
        let archive_err = |source| Error::Archive {
            path: native.clone(),
            source,
        };

        let file = File::create(&native).map_err(|e| aicm_fs::Error::io(&native, e))?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let source_root = self.layout.source_root();
        let files = io::list_files(&source_root)?;
        let mut redactions = 0;

        for relative in &files {
            let mut bytes = io::read_bytes(&source_root.join_relative(relative))?;
            if let Some(sanitizer) = self.sanitizer {
                let sanitized = sanitizer.sanitize_bytes(&bytes);
                if sanitized.redactions > 0 {
                    tracing::debug!(path = %relative, redactions = sanitized.redactions, "Sanitized file");
                }
                redactions += sanitized.redactions;
                bytes = sanitized.content;
            }

            zip.start_file(format!("{ARCHIVE_SOURCE_DIR}/{relative}"), options)
                .map_err(archive_err)?;
            zip.write_all(&bytes)
                .map_err(|e| aicm_fs::Error::io(&native, e))?;
        }

        zip.start_file(ARCHIVE_MAPPING, options).map_err(archive_err)?;
        zip.write_all(self.mapping.to_json()?.as_bytes())
            .map_err(|e| aicm_fs::Error::io(&native, e))?;

        let metadata = PackageMetadata {
            format: PACKAGE_FORMAT,
            created_at: Utc::now(),
            sanitized: self.sanitizer.is_some(),
            files: files.len(),
        };
        zip.start_file(ARCHIVE_METADATA, options).map_err(archive_err)?;
        zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())
            .map_err(|e| aicm_fs::Error::io(&native, e))?;

        let file = zip.finish().map_err(archive_err)?;
        file.sync_all().map_err(|e| aicm_fs::Error::io(&native, e))?;

        Ok(ExportResult {
            path: dest.to_string(),
            files: files.len(),
            sanitized: self.sanitizer.is_some(),
            redactions,
        })
    }
}
