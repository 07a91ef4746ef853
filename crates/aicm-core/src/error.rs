//! Error types for aicm-core

use std::path::PathBuf;

/// Result type for aicm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source, target, backup or archive does not exist
    NotFound,
    /// Mapping or settings rejected at load/save time
    InvalidConfig,
    /// Apply referenced ids absent from a freshly recomputed preview
    StaleSelection,
    /// Caller-supplied input is malformed (bad path, scope, package)
    InvalidInput,
    /// Read, write or archive failure
    IoFailure,
}

/// Errors that can occur in aicm-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Configuration rejected as a whole; lists every offending entry
    #[error("{subject} is invalid: {}", .problems.join("; "))]
    InvalidConfig {
        subject: String,
        problems: Vec<String>,
    },

    /// Apply was asked for ids the current preview does not contain
    #[error("Stale selection, unknown sync item id(s): {}", .ids.join(", "))]
    StaleSelection { ids: Vec<String> },

    /// Scope name outside `source`, `codex`, `gemini`, `claude`
    #[error("Unknown scope: {name}")]
    UnknownScope { name: String },

    /// Share package is structurally unusable
    #[error("Invalid share package {path}: {message}")]
    InvalidPackage { path: PathBuf, message: String },

    /// Zip reader/writer failure
    #[error("Archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Stored pre-image missing or failing its checksum
    #[error("Backup {backup_id} is corrupt: {detail}")]
    CorruptBackup { backup_id: String, detail: String },

    /// A sync write failed after others succeeded
    #[error(
        "Sync apply failed writing {failed} after {} successful write(s){}: {source}",
        .succeeded.len(),
        restore_hint(.backup_id.as_deref())
    )]
    PartialApply {
        backup_id: Option<String>,
        failed: String,
        succeeded: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    /// A restore write or delete failed after others succeeded
    #[error(
        "Restore of {backup_id} failed at {failed} after {} restored file(s): {source}",
        .restored.len()
    )]
    PartialRestore {
        backup_id: String,
        failed: String,
        restored: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    /// An import write failed after others succeeded
    #[error(
        "Import failed writing {failed} after {} successful write(s){}: {source}",
        .written.len(),
        restore_hint(.backup_id.as_deref())
    )]
    PartialImport {
        backup_id: Option<String>,
        failed: String,
        written: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    // Transparent wrappers for underlying errors
    /// Filesystem error from aicm-fs
    #[error(transparent)]
    Fs(#[from] aicm_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn invalid_config(subject: impl Into<String>, problems: Vec<String>) -> Self {
        Self::InvalidConfig {
            subject: subject.into(),
            problems,
        }
    }

    pub fn invalid_package(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPackage {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::StaleSelection { .. } => ErrorKind::StaleSelection,
            Self::UnknownScope { .. } | Self::InvalidPackage { .. } => ErrorKind::InvalidInput,
            Self::Fs(aicm_fs::Error::InvalidPath { .. }) => ErrorKind::InvalidInput,
            Self::Fs(aicm_fs::Error::ConfigParse { .. }) => ErrorKind::InvalidConfig,
            Self::Fs(err) if err.is_not_found() => ErrorKind::NotFound,
            Self::PartialApply { source, .. }
            | Self::PartialRestore { source, .. }
            | Self::PartialImport { source, .. } => source.kind(),
            Self::Archive { .. }
            | Self::CorruptBackup { .. }
            | Self::Fs(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::IoFailure,
        }
    }

    /// Backup the caller can restore to recover from a partially applied mutation.
    pub fn recovery_backup(&self) -> Option<&str> {
        match self {
            Self::PartialApply { backup_id, .. } | Self::PartialImport { backup_id, .. } => {
                backup_id.as_deref()
            }
            _ => None,
        }
    }
}

fn restore_hint(backup_id: Option<&str>) -> String {
    match backup_id {
        Some(id) => format!(" (restore backup {id} to roll back)"),
        None => String::new(),
    }
}
