//! Whole-document mapping validation

use std::collections::HashMap;

use aicm_fs::{RelativePath, validate_identifier};

use super::{CategoryMapping, MAPPING_VERSION, MappingConfig, RawCategory, RawMapping, SyncMode};
use crate::scope::Agent;

/// Validate a raw mapping, reporting every problem at once.
pub fn validate(raw: RawMapping) -> Result<MappingConfig, Vec<String>> {
    let mut problems = Vec::new();

    if raw.version != u64::from(MAPPING_VERSION) {
        problems.push(format!(
            "unsupported mapping version {} (expected {MAPPING_VERSION})",
            raw.version
        ));
    }

    let mut seen_names: Vec<&str> = Vec::new();
    let mut claimed: HashMap<(Agent, RelativePath), &str> = HashMap::new();
    let mut categories = Vec::with_capacity(raw.categories.0.len());

    for (name, entry) in &raw.categories.0 {
        if name.trim().is_empty() {
            problems.push("category name must not be empty".to_string());
            continue;
        }
        if let Err(reason) = validate_identifier(name, "category name") {
            problems.push(reason);
            continue;
        }
        if seen_names.contains(&name.as_str()) {
            problems.push(format!("category '{name}' is declared more than once"));
            continue;
        }
        seen_names.push(name);

        let Some(mapping) = validate_category(name, entry, &mut problems) else {
            continue;
        };

        for agent in Agent::ALL {
            let Some(target) = mapping.target(agent) else {
                continue;
            };
            if let Some(owner) = claimed.insert((agent, target.clone()), name) {
                problems.push(format!(
                    "categories '{owner}' and '{name}' both target {agent}/{target}"
                ));
            }
        }

        categories.push((name.clone(), mapping));
    }

    if problems.is_empty() {
        Ok(MappingConfig {
            version: MAPPING_VERSION,
            categories,
        })
    } else {
        Err(problems)
    }
}

fn validate_category(
    name: &str,
    entry: &RawCategory,
    problems: &mut Vec<String>,
) -> Option<CategoryMapping> {
    let before = problems.len();

    let mut path = |field: &str, raw: &str| -> Option<RelativePath> {
        if raw.trim().is_empty() {
            return None;
        }
        match RelativePath::parse(raw) {
            Ok(path) => Some(path),
            Err(err) => {
                problems.push(format!("category '{name}': {field}: {err}"));
                None
            }
        }
    };

    let source = entry.source.as_deref().and_then(|raw| path("source", raw));
    let codex = path("codex", &entry.codex);
    let gemini = path("gemini", &entry.gemini);
    let claude = path("claude", &entry.claude);

    let sync_mode = match entry.sync_mode.as_deref().map(str::trim) {
        None | Some("") | Some("replace") => SyncMode::Replace,
        Some("append") => SyncMode::Append,
        Some(other) => {
            problems.push(format!(
                "category '{name}': unknown sync_mode '{other}' (expected replace or append)"
            ));
            SyncMode::Replace
        }
    };

    let mapping = CategoryMapping {
        source,
        codex,
        gemini,
        claude,
        sync_mode,
    };

    let targets_nothing = [&entry.codex, &entry.gemini, &entry.claude]
        .iter()
        .all(|raw| raw.trim().is_empty());
    if targets_nothing {
        problems.push(format!("category '{name}' targets no agent"));
    }

    (problems.len() == before).then_some(mapping)
}

#[cfg(test)]
mod tests {
    use crate::mapping::MappingConfig;
    use crate::{Error, ErrorKind};
    use rstest::rstest;

    fn problems_of(content: &str) -> Vec<String> {
        match MappingConfig::from_json(content) {
            Err(Error::InvalidConfig { problems, .. }) => problems,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[rstest]
    #[case::absolute_path(r#"{"codex": "/etc/passwd"}"#, "must be relative")]
    #[case::parent_escape(r#"{"claude": "../outside.md"}"#, "'..'")]
    #[case::no_targets(r#"{"codex": "", "gemini": "", "claude": ""}"#, "targets no agent")]
    #[case::bad_mode(r#"{"codex": "a.md", "sync_mode": "merge"}"#, "unknown sync_mode")]
    #[case::bad_source(r#"{"codex": "a.md", "source": "../x.md"}"#, "source")]
    fn rejects_bad_category(#[case] entry: &str, #[case] needle: &str) {
        let content = format!(r#"{{"version": 1, "categories": {{"c": {entry}}}}}"#);
        let problems = problems_of(&content);
        assert_eq!(problems.len(), 1, "{problems:?}");
        assert!(problems[0].contains(needle), "{problems:?}");
    }

    #[test]
    fn reports_all_problems_together() {
        let problems = problems_of(
            r#"{
                "version": 2,
                "categories": {
                    "a": {"codex": "/abs.md"},
                    "bad name": {"codex": "x.md"},
                    "b": {"gemini": ""}
                }
            }"#,
        );
        assert_eq!(problems.len(), 4, "{problems:?}");
        assert!(problems[0].contains("version 2"));
    }

    #[test]
    fn duplicate_category_names_rejected() {
        let problems = problems_of(
            r#"{"version": 1, "categories": {
                "dup": {"codex": "a.md"},
                "dup": {"codex": "b.md"}
            }}"#,
        );
        assert_eq!(problems, vec!["category 'dup' is declared more than once"]);
    }

    #[test]
    fn two_categories_cannot_share_a_target() {
        let problems = problems_of(
            r#"{"version": 1, "categories": {
                "one": {"claude": "CLAUDE.md"},
                "two": {"claude": "./CLAUDE.md"}
            }}"#,
        );
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("'one' and 'two'"));
    }

    #[test]
    fn same_relative_path_in_different_agents_is_fine() {
        let mapping = MappingConfig::from_json(
            r#"{"version": 1, "categories": {"mcp": {"codex": "mcp.json", "claude": "mcp.json"}}}"#,
        )
        .unwrap();
        assert_eq!(mapping.category_names(), vec!["mcp"]);
    }

    #[test]
    fn missing_version_is_invalid_config() {
        let err = MappingConfig::from_json(r#"{"categories": {}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
