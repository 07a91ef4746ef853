//! Core engine for AI Config Manager
//!
//! Keeps one authored source tree in sync with the instruction and config
//! files of several AI coding agents:
//!
//! - [`mapping`] - which source file goes to which agent path
//! - [`sync`] - side-effect-free previews and lock-protected apply
//! - [`backup`] - pre-image snapshots and restore
//! - [`package`] - shareable zip exports and imports
//! - [`workspace`] - the facade tying them together

pub mod backup;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod package;
pub mod scope;
pub mod settings;
pub mod sync;
pub mod workspace;

pub use backup::{
    BackupDetail, BackupEntry, BackupInfo, BackupRoot, BackupStore, BackupTrigger, RestoreResult,
};
pub use error::{Error, ErrorKind, Result};
pub use layout::WorkspaceLayout;
pub use mapping::{CategoryMapping, MappingConfig, SyncMode};
pub use package::{
    ExportResult, ImportFilePreview, ImportFileStatus, ImportPreview, ImportResult,
};
pub use scope::{Agent, Scope};
pub use settings::Settings;
pub use sync::{ApplySyncResult, SyncItem, SyncPreview, SyncStatus};
pub use workspace::{AgentEndpoint, FileContent, ScopeFiles, ScopeRoot, Workspace, WorkspaceInfo};
