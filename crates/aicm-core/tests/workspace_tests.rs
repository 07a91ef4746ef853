//! Tests for workspace setup, scope files, mapping and settings

use aicm_core::{Agent, Error, ErrorKind, MappingConfig, Scope, SyncStatus, Workspace};
use aicm_test_utils::TestHome;
use pretty_assertions::assert_eq;

fn open(home: &TestHome) -> Workspace {
    Workspace::open(home.path()).expect("workspace should open")
}

mod init_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_creates_layout_and_default_mapping() {
        let home = TestHome::new();
        let workspace = open(&home);

        let info = workspace.init_workspace().unwrap();

        assert!(info.mapping_created);
        assert_eq!(info.categories, vec!["global", "mcp"]);
        assert_eq!(info.scopes.len(), 4);
        assert!(info.bootstrapped.is_empty());
        home.assert_file_exists(".ai-config-manager/mapping.json");
        assert!(home.app_root().join("source").is_dir());
        assert!(home.app_root().join("backups").is_dir());

        let again = workspace.init_workspace().unwrap();
        assert!(!again.mapping_created);
    }

    #[test]
    fn test_init_keeps_existing_mapping() {
        let home = TestHome::new();
        home.write_mapping(r#"{"version": 1, "categories": {"notes": {"codex": "NOTES.md"}}}"#);

        let info = open(&home).init_workspace().unwrap();

        assert!(!info.mapping_created);
        assert_eq!(info.categories, vec!["notes"]);
    }

    #[test]
    fn test_bootstrap_adopts_existing_agent_files() {
        let home = TestHome::new();
        home.write_agent("claude", "CLAUDE.md", "claude rules\n");
        home.write_agent("codex", "mcp.json", "{\"servers\": {}}\n");
        let workspace = open(&home);

        let info = workspace.init_workspace().unwrap();

        assert_eq!(
            info.bootstrapped,
            vec!["instructions/global.claude.md", "mcp/servers.codex.json"]
        );
        assert_eq!(
            home.read_source("instructions/global.claude.md").as_deref(),
            Some("claude rules\n")
        );

        let preview = workspace.preview_sync().unwrap();
        assert_eq!(preview.items.len(), 6);
        for item in &preview.items {
            assert_eq!(item.status, SyncStatus::Unchanged, "{}", item.id);
        }
    }

    #[test]
    fn test_no_bootstrap_when_source_has_files() {
        let home = TestHome::new();
        home.write_source("instructions/global.md", "authored");
        home.write_agent("claude", "CLAUDE.md", "claude rules");

        let info = open(&home).init_workspace().unwrap();

        assert!(info.bootstrapped.is_empty());
        assert_eq!(home.read_source("instructions/global.claude.md"), None);
    }

    #[test]
    fn test_endpoints_cover_roots_and_targets() {
        let home = TestHome::new();
        home.write_agent("claude", "CLAUDE.md", "x");
        let workspace = open(&home);

        let endpoints = workspace.get_agent_endpoints().unwrap();

        assert_eq!(endpoints.len(), 9);
        let claude: Vec<_> = endpoints.iter().filter(|e| e.agent == Agent::Claude).collect();
        assert_eq!(
            claude.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>(),
            vec!["root", "global", "mcp"]
        );
        assert!(claude[0].exists);
        assert!(claude[1].exists);
        assert!(!claude[2].exists);

        let codex_root = endpoints
            .iter()
            .find(|e| e.agent == Agent::Codex && e.kind == "root")
            .unwrap();
        assert!(!codex_root.exists);
    }
}

mod scope_file_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_read_list_delete() {
        let home = TestHome::new();
        let workspace = open(&home);

        workspace
            .save_scope_file(Scope::Source, "instructions/review.md", "review carefully")
            .unwrap();
        workspace
            .save_scope_file(Scope::Claude, "commands/ship.md", "ship it")
            .unwrap();

        let listed = workspace.list_scope_files(Scope::Source).unwrap();
        assert_eq!(listed.files, vec!["instructions/review.md"]);
        assert!(listed.base_path.ends_with(".ai-config-manager/source"));

        let file = workspace
            .read_scope_file(Scope::Claude, "commands/ship.md")
            .unwrap();
        assert_eq!(file.content, "ship it");
        assert_eq!(file.relative_path, "commands/ship.md");
        home.assert_file_eq(".claude/commands/ship.md", "ship it");

        workspace
            .delete_scope_file(Scope::Source, "instructions/review.md")
            .unwrap();
        assert!(workspace.list_scope_files(Scope::Source).unwrap().files.is_empty());
    }

    #[test]
    fn test_missing_files_are_not_found() {
        let home = TestHome::new();
        let workspace = open(&home);

        let read = workspace.read_scope_file(Scope::Codex, "AGENTS.md").unwrap_err();
        assert_eq!(read.kind(), ErrorKind::NotFound);

        let delete = workspace
            .delete_scope_file(Scope::Source, "nothing.md")
            .unwrap_err();
        assert_eq!(delete.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_escaping_paths_are_invalid_input() {
        let home = TestHome::new();
        let workspace = open(&home);

        for path in ["../outside.md", "/etc/passwd", "a/../../b.md"] {
            let err = workspace
                .save_scope_file(Scope::Source, path, "nope")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{path}");
        }
        home.assert_file_not_exists("outside.md");
    }

    #[test]
    fn test_listing_missing_scope_is_empty() {
        let home = TestHome::new();
        let listed = open(&home).list_scope_files(Scope::Gemini).unwrap();
        assert!(listed.files.is_empty());
    }
}

mod mapping_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_mapping_reads_as_default() {
        let home = TestHome::new();
        let mapping = open(&home).get_mapping().unwrap();
        assert_eq!(mapping, MappingConfig::default_mapping());
        home.assert_file_not_exists(".ai-config-manager/mapping.json");
    }

    #[test]
    fn test_save_keeps_category_order() {
        let home = TestHome::new();
        let workspace = open(&home);
        let mapping = MappingConfig::from_json(
            r#"{"version": 1, "categories": {
                "zeta": {"codex": "Z.md"},
                "alpha": {"claude": "A.md", "sync_mode": "append"}
            }}"#,
        )
        .unwrap();

        workspace.save_mapping(&mapping).unwrap();

        let loaded = workspace.get_mapping().unwrap();
        assert_eq!(loaded.category_names(), vec!["zeta", "alpha"]);
        assert_eq!(loaded, mapping);
    }

    #[test]
    fn test_invalid_stored_mapping_is_reported() {
        let home = TestHome::new();
        home.write_mapping(r#"{"version": 1, "categories": {"a": {"codex": "X.md"}, "b": {"codex": "X.md"}}}"#);

        let err = open(&home).preview_sync().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        match err {
            Error::InvalidConfig { problems, .. } => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].contains("both target"), "{problems:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod settings_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_agent_root_override() {
        let home = TestHome::new();
        home.write_settings("[agents]\nclaude = \"custom/claude\"\n");
        home.write_source("instructions/global.md", "rules");
        let workspace = open(&home);

        workspace.apply_sync(&["claude:global".to_string()]).unwrap();

        home.assert_file_eq("custom/claude/CLAUDE.md", "rules");
        home.assert_file_not_exists(".claude/CLAUDE.md");
    }

    #[test]
    fn test_invalid_settings_fail_to_open() {
        let home = TestHome::new();
        home.write_settings("[locking]\ntimeout_ms = 0\n\n[sanitize]\npatterns = [\"(\"]\n");

        let err = Workspace::open(home.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        match err {
            Error::InvalidConfig { problems, .. } => assert_eq!(problems.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_settings_are_invalid_config() {
        let home = TestHome::new();
        home.write_settings("[locking\n");

        let err = Workspace::open(home.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
