//! Agents and file scopes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An agent whose config directory receives synced files.
///
/// Declaration order is the canonical processing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Codex,
    Gemini,
    Claude,
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Codex, Agent::Gemini, Agent::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    /// Directory name under the home directory, e.g. `.codex`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Codex => ".codex",
            Self::Gemini => ".gemini",
            Self::Claude => ".claude",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Agent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == s)
            .ok_or_else(|| Error::UnknownScope { name: s.to_string() })
    }
}

/// A root whose files can be listed, read, written and deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Source,
    Codex,
    Gemini,
    Claude,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Source, Scope::Codex, Scope::Gemini, Scope::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    /// The agent behind this scope; `None` for the source tree.
    pub fn agent(&self) -> Option<Agent> {
        match self {
            Self::Source => None,
            Self::Codex => Some(Agent::Codex),
            Self::Gemini => Some(Agent::Gemini),
            Self::Claude => Some(Agent::Claude),
        }
    }
}

impl From<Agent> for Scope {
    fn from(agent: Agent) -> Self {
        match agent {
            Agent::Codex => Self::Codex,
            Agent::Gemini => Self::Gemini,
            Agent::Claude => Self::Claude,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| Error::UnknownScope { name: s.to_string() })
    }
}
