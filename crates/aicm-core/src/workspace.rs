//! The workspace facade
//!
//! [`Workspace`] is the single entry point the CLI (or any other front end)
//! talks to. Reads run without coordination; every mutation holds the
//! workspace lock for its whole critical section.

use std::path::{Path, PathBuf};

use aicm_fs::{FileLock, NormalizedPath, RelativePath, RobustnessConfig, io};
use serde::{Deserialize, Serialize};

use crate::backup::{
    BackupDetail, BackupInfo, BackupRoot, BackupStore, BackupTrigger, RestoreEngine,
    RestoreResult, SnapshotTarget,
};
use crate::layout::WorkspaceLayout;
use crate::mapping::{MappingConfig, overlay_path};
use crate::package::sanitize::Sanitizer;
use crate::package::{ExportResult, ImportPreview, ImportResult, PackageExporter, PackageImporter};
use crate::scope::{Agent, Scope};
use crate::settings::Settings;
use crate::sync::{ApplySyncResult, PreviewEngine, SyncApplier, SyncPreview};
use crate::{Error, Result};

/// Where one scope lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRoot {
    pub scope: Scope,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub home: String,
    pub app_root: String,
    pub source_root: String,
    pub mapping_path: String,
    /// Was the default mapping written by this call?
    pub mapping_created: bool,
    pub categories: Vec<String>,
    pub scopes: Vec<ScopeRoot>,
    /// Source files seeded from existing agent files
    pub bootstrapped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFiles {
    pub scope: Scope,
    pub base_path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub scope: Scope,
    pub relative_path: String,
    pub absolute_path: String,
    pub content: String,
}

/// An agent location worth showing: its root or a mapped target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEndpoint {
    pub agent: Agent,
    /// `root` for the agent directory, otherwise the category name
    pub kind: String,
    pub path: String,
    pub exists: bool,
}

/// One home directory's sync workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    layout: WorkspaceLayout,
    settings: Settings,
    robustness: RobustnessConfig,
}

impl Workspace {
    /// Open the workspace rooted at `home`, loading `settings.toml` if present.
    pub fn open(home: impl AsRef<Path>) -> Result<Self> {
        let layout = WorkspaceLayout::new(home);
        let settings = Settings::load(&layout)?;
        let layout = settings.apply_to(layout);
        let robustness = RobustnessConfig {
            lock_timeout: settings.locking.timeout(),
            ..RobustnessConfig::default()
        };
        Ok(Self {
            layout,
            settings,
            robustness,
        })
    }

    /// Open using `explicit_home`, else `AICM_HOME`, else the user's home.
    pub fn discover(explicit_home: Option<PathBuf>) -> Result<Self> {
        Self::open(WorkspaceLayout::resolve_home(explicit_home)?)
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ---------------------------------------------------------------------
    // Setup
    // ---------------------------------------------------------------------

    /// Create the workspace directories and default mapping if missing.
    ///
    /// When the source scope is empty, existing agent files are copied in as
    /// per-agent overlays so the first preview leaves them untouched.
    pub fn init_workspace(&self) -> Result<WorkspaceInfo> {
        let _lock = self.lock()?;
        let source_root = self.layout.source_root();
        for dir in [&source_root, &self.layout.backups_root()] {
            std::fs::create_dir_all(dir.to_native())
                .map_err(|e| aicm_fs::Error::io(dir.to_native(), e))?;
        }

        let mapping_path = self.layout.mapping_path();
        let mapping_created = !mapping_path.exists();
        let mapping = if mapping_created {
            let mapping = MappingConfig::default_mapping();
            self.write_mapping(&mapping)?;
            mapping
        } else {
            self.get_mapping()?
        };

        let bootstrapped = if io::list_files(&source_root)?.is_empty() {
            self.bootstrap_source(&mapping)?
        } else {
            Vec::new()
        };

        tracing::info!(
            app_root = %self.layout.app_root(),
            mapping_created,
            bootstrapped = bootstrapped.len(),
            "Initialized workspace"
        );

        Ok(WorkspaceInfo {
            home: self.layout.home().to_string(),
            app_root: self.layout.app_root().to_string(),
            source_root: source_root.to_string(),
            mapping_path: mapping_path.to_string(),
            mapping_created,
            categories: mapping.category_names(),
            scopes: Scope::ALL
                .into_iter()
                .map(|scope| ScopeRoot {
                    scope,
                    path: self.layout.scope_root(scope).to_string(),
                })
                .collect(),
            bootstrapped,
        })
    }

    /// Agent roots and every mapped target, with existence flags.
    pub fn get_agent_endpoints(&self) -> Result<Vec<AgentEndpoint>> {
        let mapping = self.get_mapping()?;
        let mut endpoints = Vec::new();
        for agent in Agent::ALL {
            let root = self.layout.agent_root(agent);
            endpoints.push(AgentEndpoint {
                agent,
                kind: "root".to_string(),
                path: root.to_string(),
                exists: root.is_dir(),
            });
            for (category, entry) in mapping.categories() {
                if let Some(target) = entry.target(agent) {
                    let path = root.join_relative(target);
                    endpoints.push(AgentEndpoint {
                        agent,
                        kind: category.to_string(),
                        exists: path.is_file(),
                        path: path.to_string(),
                    });
                }
            }
        }
        Ok(endpoints)
    }

    // ---------------------------------------------------------------------
    // Scope files
    // ---------------------------------------------------------------------

    pub fn list_scope_files(&self, scope: Scope) -> Result<ScopeFiles> {
        let root = self.layout.scope_root(scope);
        let files = io::list_files(&root)?
            .into_iter()
            .map(|path| path.to_string())
            .collect();
        Ok(ScopeFiles {
            scope,
            base_path: root.to_string(),
            files,
        })
    }

    pub fn read_scope_file(&self, scope: Scope, relative_path: &str) -> Result<FileContent> {
        let (relative, path) = self.scope_path(scope, relative_path)?;
        let content = io::read_text_optional(&path)?
            .ok_or_else(|| Error::not_found(format!("{scope}/{relative}")))?;
        Ok(FileContent {
            scope,
            relative_path: relative.to_string(),
            absolute_path: path.to_string(),
            content,
        })
    }

    /// Write a file in a scope, creating parent directories.
    pub fn save_scope_file(&self, scope: Scope, relative_path: &str, content: &str) -> Result<()> {
        let (relative, path) = self.scope_path(scope, relative_path)?;
        let _lock = self.lock()?;
        io::write_atomic(&path, content.as_bytes(), self.robustness)?;
        tracing::info!(scope = %scope, path = %relative, "Saved scope file");
        Ok(())
    }

    pub fn delete_scope_file(&self, scope: Scope, relative_path: &str) -> Result<()> {
        let (relative, path) = self.scope_path(scope, relative_path)?;
        let _lock = self.lock()?;
        if !path.is_file() {
            return Err(Error::not_found(format!("{scope}/{relative}")));
        }
        io::remove_file(&path)?;
        tracing::info!(scope = %scope, path = %relative, "Deleted scope file");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mapping
    // ---------------------------------------------------------------------

    /// The stored mapping, or the default one when none has been saved.
    pub fn get_mapping(&self) -> Result<MappingConfig> {
        match io::read_text_optional(&self.layout.mapping_path())? {
            Some(content) => MappingConfig::from_json(&content),
            None => Ok(MappingConfig::default_mapping()),
        }
    }

    pub fn save_mapping(&self, mapping: &MappingConfig) -> Result<()> {
        let _lock = self.lock()?;
        self.write_mapping(mapping)?;
        tracing::info!(categories = mapping.category_names().len(), "Saved mapping");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Sync
    // ---------------------------------------------------------------------

    /// What a sync would do right now. Never writes.
    pub fn preview_sync(&self) -> Result<SyncPreview> {
        let mapping = self.get_mapping()?;
        PreviewEngine::new(&self.layout, &mapping).build()
    }

    /// Apply the selected preview items against freshly recomputed state.
    pub fn apply_sync(&self, selected_ids: &[String]) -> Result<ApplySyncResult> {
        let _lock = self.lock()?;
        let mapping = self.get_mapping()?;
        let preview = PreviewEngine::new(&self.layout, &mapping).build()?;
        let store = self.backups();
        SyncApplier::new(&self.layout, &store, self.robustness).apply(&preview, selected_ids)
    }

    // ---------------------------------------------------------------------
    // Backups
    // ---------------------------------------------------------------------

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        self.backups().list()
    }

    pub fn get_backup_detail(&self, backup_id: &str) -> Result<BackupDetail> {
        self.backups().detail(backup_id)
    }

    pub fn restore_backup(&self, backup_id: &str) -> Result<RestoreResult> {
        let _lock = self.lock()?;
        let store = self.backups();
        RestoreEngine::new(&store, self.robustness).restore(backup_id)
    }

    pub fn delete_backup(&self, backup_id: &str) -> Result<()> {
        let _lock = self.lock()?;
        self.backups().delete(backup_id)
    }

    /// Snapshot every source file and every mapped agent target.
    pub fn create_backup(&self) -> Result<BackupInfo> {
        let _lock = self.lock()?;
        let mapping = self.get_mapping()?;

        let source_root = self.layout.source_root();
        let mut targets: Vec<SnapshotTarget> = io::list_files(&source_root)?
            .into_iter()
            .map(|relative| {
                let absolute = source_root.join_relative(&relative);
                SnapshotTarget::new(BackupRoot::Source, relative, absolute)
            })
            .collect();

        for (_, entry) in mapping.categories() {
            for agent in entry.targeted_agents() {
                if let Some(target) = entry.target(agent) {
                    targets.push(SnapshotTarget::new(
                        agent.into(),
                        target.clone(),
                        self.layout.agent_root(agent).join_relative(target),
                    ));
                }
            }
        }

        let manifest = self.backups().create(BackupTrigger::Manual, &targets)?;
        Ok(BackupInfo::from(&manifest))
    }

    // ---------------------------------------------------------------------
    // Share packages
    // ---------------------------------------------------------------------

    /// Export to `exports/aicm-share-<timestamp>.zip`.
    pub fn export_share_package(&self, sanitize: bool) -> Result<ExportResult> {
        let mapping = self.get_mapping()?;
        let exporter = PackageExporter::new(&self.layout, &mapping);
        let dest = exporter.default_destination();
        self.run_export(exporter, &dest, sanitize)
    }

    pub fn export_share_package_to(&self, dest: impl AsRef<Path>, sanitize: bool) -> Result<ExportResult> {
        let mapping = self.get_mapping()?;
        let exporter = PackageExporter::new(&self.layout, &mapping);
        self.run_export(exporter, &NormalizedPath::new(dest), sanitize)
    }

    pub fn preview_import_package(&self, zip_path: impl AsRef<Path>) -> Result<ImportPreview> {
        let store = self.backups();
        PackageImporter::new(&self.layout, &store, self.robustness).preview(zip_path.as_ref())
    }

    pub fn apply_import_package(
        &self,
        zip_path: impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<ImportResult> {
        let _lock = self.lock()?;
        let store = self.backups();
        PackageImporter::new(&self.layout, &store, self.robustness)
            .apply(zip_path.as_ref(), overwrite)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn lock(&self) -> Result<FileLock> {
        Ok(FileLock::acquire(
            &self.layout.lock_path(),
            self.settings.locking.timeout(),
        )?)
    }

    fn backups(&self) -> BackupStore {
        BackupStore::new(self.layout.backups_root()).with_robustness(self.robustness)
    }

    fn scope_path(&self, scope: Scope, relative_path: &str) -> Result<(RelativePath, NormalizedPath)> {
        let relative = RelativePath::parse(relative_path)?;
        let path = self.layout.scope_root(scope).join_relative(&relative);
        Ok((relative, path))
    }

    fn write_mapping(&self, mapping: &MappingConfig) -> Result<()> {
        io::write_atomic(
            &self.layout.mapping_path(),
            mapping.to_json()?.as_bytes(),
            self.robustness,
        )?;
        Ok(())
    }

    fn run_export(
        &self,
        exporter: PackageExporter<'_>,
        dest: &NormalizedPath,
        sanitize: bool,
    ) -> Result<ExportResult> {
        if sanitize {
            let sanitizer = Sanitizer::from_settings(&self.settings.sanitize)?;
            exporter.sanitize_with(&sanitizer).export_to(dest)
        } else {
            exporter.export_to(dest)
        }
    }

    /// Copy each existing, non-blank mapped target into its overlay file.
    fn bootstrap_source(&self, mapping: &MappingConfig) -> Result<Vec<String>> {
        let source_root = self.layout.source_root();
        let mut written = Vec::new();

        for (category, entry) in mapping.categories() {
            let base = entry.source_path(category)?;
            for agent in entry.targeted_agents() {
                let Some(target) = entry.target(agent) else {
                    continue;
                };
                let existing = io::read_text_optional(&self.layout.agent_root(agent).join_relative(target))?;
                let Some(content) = existing.filter(|text| !text.trim().is_empty()) else {
                    continue;
                };

                let overlay = overlay_path(&base, agent)?;
                io::write_atomic(
                    &source_root.join_relative(&overlay),
                    content.as_bytes(),
                    self.robustness,
                )?;
                tracing::debug!(agent = %agent, category, path = %overlay, "Bootstrapped source file");
                written.push(overlay.to_string());
            }
        }

        if !written.is_empty() {
            tracing::info!(files = written.len(), "Bootstrapped source from agent files");
        }
        Ok(written)
    }
}
