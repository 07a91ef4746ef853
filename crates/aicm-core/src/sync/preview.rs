//! Preview computation: what a sync would write, without writing it

use aicm_fs::{NormalizedPath, RelativePath, io};
use chrono::Utc;

use super::append::merge_append;
use super::{SyncItem, SyncPreview, SyncStatus};
use crate::Result;
use crate::layout::WorkspaceLayout;
use crate::mapping::{CategoryMapping, MappingConfig, SyncMode, overlay_path};
use crate::scope::Agent;

/// Composed source content for one `(category, agent)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedSource {
    pub content: String,
    /// Source file(s) that contributed, `base + overlay` when both did
    pub description: String,
}

/// Builds [`SyncPreview`]s from the mapping and the files on disk.
pub struct PreviewEngine<'a> {
    layout: &'a WorkspaceLayout,
    mapping: &'a MappingConfig,
}

impl<'a> PreviewEngine<'a> {
    pub fn new(layout: &'a WorkspaceLayout, mapping: &'a MappingConfig) -> Self {
        Self { layout, mapping }
    }

    /// One item per targeted `(category, agent)`, in mapping order then
    /// codex, gemini, claude.
    pub fn build(&self) -> Result<SyncPreview> {
        let mut items = Vec::new();
        for (category, mapping) in self.mapping.categories() {
            for agent in Agent::ALL {
                if let Some((target, mode)) = self.mapping.resolve(category, agent) {
                    items.push(self.plan_item(category, mapping, agent, target, mode)?);
                }
            }
        }

        tracing::debug!(items = items.len(), "Computed sync preview");
        Ok(SyncPreview {
            generated_at: Utc::now(),
            items,
        })
    }

    /// Base source file plus this agent's overlay, if any.
    ///
    /// Blank files only drop out of overlay composition; a blank base with
    /// no overlay is passed through as written.
    pub fn compose_source(
        &self,
        category: &str,
        mapping: &CategoryMapping,
        agent: Agent,
    ) -> Result<ComposedSource> {
        let source_root = self.layout.source_root();
        let base_path = mapping.source_path(category)?;
        let overlay = overlay_path(&base_path, agent)?;

        let raw_base = io::read_text_optional(&source_root.join_relative(&base_path))?;
        let extra = read_authored(&source_root, &overlay)?;
        let base = raw_base.clone().filter(|text| !is_blank(text));

        Ok(match (base, extra) {
            (Some(base), Some(extra)) => ComposedSource {
                content: format!("{}\n\n{}", base.trim_end(), extra),
                description: format!("{base_path} + {overlay}"),
            },
            (Some(base), None) => ComposedSource {
                content: base,
                description: base_path.to_string(),
            },
            (None, Some(extra)) => ComposedSource {
                content: extra,
                description: overlay.to_string(),
            },
            (None, None) => ComposedSource {
                content: raw_base.unwrap_or_default(),
                description: base_path.to_string(),
            },
        })
    }

    fn plan_item(
        &self,
        category: &str,
        mapping: &CategoryMapping,
        agent: Agent,
        target: &RelativePath,
        mode: SyncMode,
    ) -> Result<SyncItem> {
        let source = self.compose_source(category, mapping, agent)?;
        let target_path = self.layout.agent_root(agent).join_relative(target);
        let current = io::read_text_optional(&target_path)?;
        let exists = current.is_some();
        let before = current.unwrap_or_default();

        let (after, status) = plan_content(&before, exists, &source.content, mode, category);
        tracing::debug!(
            agent = %agent,
            category,
            target = %target,
            status = %status,
            "Planned sync item"
        );

        Ok(SyncItem {
            id: SyncItem::item_id(agent, category),
            agent,
            category: category.to_string(),
            source_file: source.description,
            target_relative_path: target.clone(),
            target_absolute_path: target_path.to_string(),
            status,
            before,
            after,
        })
    }
}

/// Content and status for one target given its current state.
pub fn plan_content(
    before: &str,
    target_exists: bool,
    source: &str,
    mode: SyncMode,
    category: &str,
) -> (String, SyncStatus) {
    let after = match mode {
        SyncMode::Replace => source.to_string(),
        SyncMode::Append => merge_append(before, source, category),
    };

    let status = if after == before {
        SyncStatus::Unchanged
    } else if !target_exists {
        SyncStatus::Create
    } else if mode == SyncMode::Append {
        SyncStatus::Append
    } else {
        SyncStatus::Update
    };
    (after, status)
}

/// Read a source file, treating missing or blank content as unauthored.
fn read_authored(root: &NormalizedPath, relative: &RelativePath) -> Result<Option<String>> {
    let content = io::read_text_optional(&root.join_relative(relative))?;
    Ok(content.filter(|text| !is_blank(text)))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
