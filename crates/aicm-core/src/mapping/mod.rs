//! Category mapping: which source file lands where in each agent
//!
//! Stored as `mapping.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "categories": {
//!     "global": {
//!       "codex": "AGENTS.md",
//!       "gemini": "GEMINI.md",
//!       "claude": "CLAUDE.md",
//!       "sync_mode": "replace"
//!     }
//!   }
//! }
//! ```
//!
//! Category order in the file is preserved and drives preview order.

mod validate;

use std::fmt;

use aicm_fs::RelativePath;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scope::Agent;
use crate::{Error, Result};

pub use validate::validate;

pub const MAPPING_VERSION: u32 = 1;

/// Default directory for a category's source file when none is declared.
pub const DEFAULT_SOURCE_DIR: &str = "instructions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Target content becomes exactly the source content
    #[default]
    Replace,
    /// Source content is kept as a marked block inside the target
    Append,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated category entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMapping {
    pub source: Option<RelativePath>,
    pub codex: Option<RelativePath>,
    pub gemini: Option<RelativePath>,
    pub claude: Option<RelativePath>,
    pub sync_mode: SyncMode,
}

impl CategoryMapping {
    pub fn target(&self, agent: Agent) -> Option<&RelativePath> {
        match agent {
            Agent::Codex => self.codex.as_ref(),
            Agent::Gemini => self.gemini.as_ref(),
            Agent::Claude => self.claude.as_ref(),
        }
    }

    /// Source file under `source/`; `instructions/<category>.md` unless declared.
    pub fn source_path(&self, category: &str) -> Result<RelativePath> {
        match &self.source {
            Some(path) => Ok(path.clone()),
            None => Ok(RelativePath::parse(&format!(
                "{DEFAULT_SOURCE_DIR}/{category}.md"
            ))?),
        }
    }

    /// Agents this category writes to, in canonical order.
    pub fn targeted_agents(&self) -> impl Iterator<Item = Agent> + '_ {
        Agent::ALL
            .into_iter()
            .filter(|agent| self.target(*agent).is_some())
    }
}

/// Per-agent overlay next to a base source file: `dir/stem.<agent>.ext`.
pub fn overlay_path(base: &RelativePath, agent: Agent) -> Result<RelativePath> {
    let name = base.file_name();
    let overlay = match base.extension() {
        Some(ext) => {
            let stem = &name[..name.len() - ext.len() - 1];
            format!("{stem}.{agent}.{ext}")
        }
        None => format!("{name}.{agent}"),
    };
    Ok(base.with_file_name(&overlay)?)
}

/// The validated mapping document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    version: u32,
    categories: Vec<(String, CategoryMapping)>,
}

impl MappingConfig {
    /// Parse and validate `mapping.json` content.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawMapping = serde_json::from_str(content)
            .map_err(|e| Error::invalid_config("Mapping", vec![e.to_string()]))?;
        validate(raw).map_err(|problems| Error::invalid_config("Mapping", problems))
    }

    pub fn to_json(&self) -> Result<String> {
        let mut rendered = serde_json::to_string_pretty(self)?;
        rendered.push('\n');
        Ok(rendered)
    }

    /// The mapping written on first initialization.
    pub fn default_mapping() -> Self {
        let path = |p: &str| RelativePath::parse(p).ok();
        Self {
            version: MAPPING_VERSION,
            categories: vec![
                (
                    "global".to_string(),
                    CategoryMapping {
                        source: None,
                        codex: path("AGENTS.md"),
                        gemini: path("GEMINI.md"),
                        claude: path("CLAUDE.md"),
                        sync_mode: SyncMode::Replace,
                    },
                ),
                (
                    "mcp".to_string(),
                    CategoryMapping {
                        source: path("mcp/servers.json"),
                        codex: path("mcp.json"),
                        gemini: path("antigravity/mcp_config.json"),
                        claude: path("mcp.json"),
                        sync_mode: SyncMode::Replace,
                    },
                ),
            ],
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryMapping)> {
        self.categories.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryMapping> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, m)| m)
    }

    /// Target path and mode for `(category, agent)`, or `None` when the
    /// category is unknown or does not target that agent.
    pub fn resolve(&self, category: &str, agent: Agent) -> Option<(&RelativePath, SyncMode)> {
        let mapping = self.get(category)?;
        mapping.target(agent).map(|path| (path, mapping.sync_mode))
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self::default_mapping()
    }
}

impl Serialize for MappingConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Document<'a> {
            version: u32,
            categories: Categories<'a>,
        }

        struct Categories<'a>(&'a [(String, CategoryMapping)]);

        impl Serialize for Categories<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, mapping) in self.0 {
                    map.serialize_entry(name, &RawCategory::from(mapping))?;
                }
                map.end()
            }
        }

        Document {
            version: self.version,
            categories: Categories(&self.categories),
        }
        .serialize(serializer)
    }
}

/// `mapping.json` as written, before validation.
#[derive(Debug, Deserialize)]
pub struct RawMapping {
    pub version: u64,
    #[serde(default)]
    pub categories: RawCategories,
}

/// Category entries in file order, duplicates kept so they can be reported.
#[derive(Debug, Default)]
pub struct RawCategories(pub Vec<(String, RawCategory)>);

impl<'de> Deserialize<'de> for RawCategories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = RawCategories;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to mapping")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, entry)) = access.next_entry::<String, RawCategory>()? {
                    entries.push((name, entry));
                }
                Ok(RawCategories(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub codex: String,
    pub gemini: String,
    pub claude: String,
    pub sync_mode: Option<String>,
}

impl From<&CategoryMapping> for RawCategory {
    fn from(mapping: &CategoryMapping) -> Self {
        let text = |p: &Option<RelativePath>| p.as_ref().map(|p| p.to_string()).unwrap_or_default();
        Self {
            source: mapping.source.as_ref().map(|p| p.to_string()),
            codex: text(&mapping.codex),
            gemini: text(&mapping.gemini),
            claude: text(&mapping.claude),
            sync_mode: Some(mapping.sync_mode.as_str().to_string()),
        }
    }
}
