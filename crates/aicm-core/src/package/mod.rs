//! Share packages: zip archives of the source scope plus the mapping
//!
//! ```text
//! aicm-share-20260301T101500Z.zip
//! ├── package.json       # { format, created_at, sanitized, files }
//! ├── mapping.json
//! └── source/<relative path>...
//! ```

mod export;
mod import;
pub mod sanitize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use export::PackageExporter;
pub use import::{PackageContents, PackageImporter, read_package};

/// Archive format written by this version
pub const PACKAGE_FORMAT: u32 = 1;

pub const ARCHIVE_SOURCE_DIR: &str = "source";
pub const ARCHIVE_MAPPING: &str = "mapping.json";
pub const ARCHIVE_METADATA: &str = "package.json";

/// Contents of `package.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub format: u32,
    pub created_at: DateTime<Utc>,
    pub sanitized: bool,
    /// Number of source files in the archive
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: String,
    pub files: usize,
    pub sanitized: bool,
    /// Secrets replaced across all files; zero when not sanitized
    pub redactions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFileStatus {
    Create,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFilePreview {
    pub relative_path: String,
    pub status: ImportFileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub zip_path: String,
    pub files: Vec<ImportFilePreview>,
    pub has_mapping: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Backup of overwritten files; `None` when nothing was overwritten
    pub backup_id: Option<String>,
    pub applied_count: usize,
    /// Colliding files left alone because `overwrite` was false
    pub skipped_count: usize,
    /// Was the archived mapping written to the workspace?
    pub mapping_applied: bool,
}
