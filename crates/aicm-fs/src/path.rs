//! Path types used at every I/O boundary
//!
//! [`NormalizedPath`] is an absolute-or-rooted location with forward slashes.
//! [`RelativePath`] is a user-supplied path that has been checked to stay
//! inside whatever root it is later joined onto.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A filesystem location stored with forward slashes.
///
/// Converted to a native `PathBuf` only when handed to `std::fs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let inner = if raw.len() > 1 {
            raw.trim_end_matches('/').to_string()
        } else {
            raw
        };
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join a raw segment. The caller is responsible for its safety.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches('/');
        if self.inner.ends_with('/') {
            Self::new(format!("{}{}", self.inner, segment))
        } else {
            Self::new(format!("{}/{}", self.inner, segment))
        }
    }

    /// Join a validated relative path; the result never escapes `self`.
    pub fn join_relative(&self, relative: &RelativePath) -> Self {
        self.join(relative.as_str())
    }

    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self::new("/")),
            Some(idx) if idx > 0 => Some(Self::new(&self.inner[..idx])),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Express `self` relative to `base`, if it lives underneath it.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<RelativePath> {
        let rest = self.inner.strip_prefix(base.as_str())?;
        let rest = rest.strip_prefix('/')?;
        RelativePath::parse(rest).ok()
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn extension(&self) -> Option<&str> {
        extension_of(self.file_name()?)
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A relative path with no root, no drive prefix and no `..` component.
///
/// `.` components and repeated separators are dropped; backslashes are
/// treated as separators. Serializes as its slash-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath {
    inner: String,
}

impl RelativePath {
    /// Validate and normalize a user-supplied relative path.
    pub fn parse(raw: &str) -> Result<Self> {
        let unified = raw.trim().replace('\\', "/");
        if unified.starts_with('/') {
            return Err(Error::invalid_path(raw, "must be relative"));
        }
        if has_drive_prefix(&unified) {
            return Err(Error::invalid_path(raw, "must not carry a drive prefix"));
        }

        let mut parts = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => {}
                ".." => return Err(Error::invalid_path(raw, "must not contain '..'")),
                other => parts.push(other),
            }
        }

        if parts.is_empty() {
            return Err(Error::invalid_path(raw, "must not be empty"));
        }

        Ok(Self {
            inner: parts.join("/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn join(&self, other: &RelativePath) -> Self {
        Self {
            inner: format!("{}/{}", self.inner, other.inner),
        }
    }

    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// Parent directory, `None` for a single-component path.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.inner.rfind('/')?;
        Some(Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    pub fn extension(&self) -> Option<&str> {
        extension_of(self.file_name())
    }

    /// Replace the last component.
    pub fn with_file_name(&self, name: &str) -> Result<Self> {
        match self.parent() {
            Some(parent) => Ok(parent.join(&Self::parse(name)?)),
            None => Self::parse(name),
        }
    }

    /// Strip a leading directory such as `source`, returning the remainder.
    pub fn strip_dir(&self, dir: &str) -> Option<Self> {
        let rest = self.inner.strip_prefix(dir)?.strip_prefix('/')?;
        Self::parse(rest).ok()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RelativePath> for String {
    fn from(value: RelativePath) -> Self {
        value.inner
    }
}

/// Check that `value` is safe to use as a single path component or id.
///
/// Allows ASCII alphanumerics plus `-`, `_` and `.`; rejects `.` and `..`.
pub fn validate_identifier(value: &str, label: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err(format!("{label} must not be empty"));
    }
    if value == "." || value == ".." {
        return Err(format!("{label} '{value}' is reserved"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!("{label} '{value}' contains invalid character '{bad}'"));
    }
    Ok(())
}

fn extension_of(name: &str) -> Option<&str> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx + 1 == name.len() {
        None
    } else {
        Some(&name[idx + 1..])
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
