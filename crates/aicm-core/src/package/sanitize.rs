//! Secret redaction for exported packages
//!
//! Rules are regular expressions. A rule may name a `prefix` and `suffix`
//! group; those parts of the match are kept and only the rest is replaced,
//! so `api_key = "abc"` becomes `api_key = "[REDACTED]"`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::settings::SanitizeSettings;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    regex: Regex,
}

static BUILTIN_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    [
        ("openai-style key", r"\bsk-(?:ant-|proj-)?[A-Za-z0-9_\-]{16,}"),
        ("github token", r"\bgh[pousr]_[A-Za-z0-9]{20,}"),
        ("aws access key id", r"\bAKIA[0-9A-Z]{16}\b"),
        ("google api key", r"\bAIza[0-9A-Za-z_\-]{35}"),
        (
            "bearer token",
            r"(?i)(?P<prefix>\bbearer\s+)[A-Za-z0-9\-._~+/]{8,}=*",
        ),
        (
            "quoted credential",
            r#"(?i)(?P<prefix>"?[A-Za-z0-9_\-]*(?:api[_\-]?key|token|secret|password)[A-Za-z0-9_\-]*"?\s*[:=]\s*")[^"\s]+(?P<suffix>")"#,
        ),
        (
            "credential assignment",
            r#"(?im)(?P<prefix>^\s*(?:export\s+)?[A-Za-z0-9_]*(?:API_?KEY|TOKEN|SECRET|PASSWORD)[A-Za-z0-9_]*\s*=\s*)[^\s"'#]+"#,
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| Rule {
        name: name.to_string(),
        regex: Regex::new(pattern).expect("built-in sanitize pattern is valid"),
    })
    .collect()
});

/// Outcome of sanitizing one piece of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized<T> {
    pub content: T,
    pub redactions: usize,
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: Vec<Rule>,
    replacement: String,
}

impl Sanitizer {
    /// Built-in rules plus any extra patterns from settings.
    ///
    /// Every invalid pattern is reported in one `InvalidConfig` error.
    pub fn from_settings(settings: &SanitizeSettings) -> Result<Self> {
        let mut rules = if settings.builtin {
            BUILTIN_RULES.clone()
        } else {
            Vec::new()
        };

        let mut problems = Vec::new();
        for pattern in &settings.patterns {
            match Regex::new(pattern) {
                Ok(regex) => rules.push(Rule {
                    name: format!("custom pattern {pattern}"),
                    regex,
                }),
                Err(err) => problems.push(format!("sanitize pattern '{pattern}': {err}")),
            }
        }
        if settings.replacement.is_empty() {
            problems.push("sanitize.replacement must not be empty".to_string());
        }

        if !problems.is_empty() {
            return Err(Error::invalid_config("Settings", problems));
        }
        Ok(Self {
            rules,
            replacement: settings.replacement.clone(),
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn sanitize_text(&self, text: &str) -> Sanitized<String> {
        let mut content = text.to_string();
        let mut redactions = 0;

        for rule in &self.rules {
            let mut hits = 0;
            let replaced = rule.regex.replace_all(&content, |caps: &Captures<'_>| {
                let whole = &caps[0];
                let offset = caps.get(0).map_or(0, |m| m.start());
                let keep_start = caps
                    .name("prefix")
                    .map_or(0, |m| m.end().saturating_sub(offset))
                    .min(whole.len());
                let keep_end = caps
                    .name("suffix")
                    .map_or(whole.len(), |m| m.start().saturating_sub(offset))
                    .clamp(keep_start, whole.len());
                if whole[keep_start..keep_end] == self.replacement {
                    return whole.to_string();
                }
                hits += 1;
                format!(
                    "{}{}{}",
                    &whole[..keep_start],
                    self.replacement,
                    &whole[keep_end..]
                )
            });
            if hits > 0 {
                tracing::debug!(rule = %rule.name, hits, "Redacted matches");
                content = replaced.into_owned();
                redactions += hits;
            }
        }

        Sanitized {
            content,
            redactions,
        }
    }

    /// Sanitize UTF-8 content; anything else passes through untouched.
    pub fn sanitize_bytes(&self, bytes: &[u8]) -> Sanitized<Vec<u8>> {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                let sanitized = self.sanitize_text(text);
                Sanitized {
                    content: sanitized.content.into_bytes(),
                    redactions: sanitized.redactions,
                }
            }
            Err(_) => Sanitized {
                content: bytes.to_vec(),
                redactions: 0,
            },
        }
    }
}
