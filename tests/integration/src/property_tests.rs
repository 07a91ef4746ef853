//! Whole-workspace scenarios for the sync, backup and restore guarantees.
//!
//! Each test drives a `Workspace` through several operations and checks
//! the resulting files byte for byte.

use std::fs;

use aicm_core::{BackupTrigger, SyncStatus, Workspace};
use aicm_test_utils::TestHome;
use pretty_assertions::assert_eq;

const THREE_AGENTS: &str = r#"{
  "version": 1,
  "categories": {
    "global": { "codex": "AGENTS.md", "gemini": "GEMINI.md", "claude": "CLAUDE.md" },
    "review": { "codex": "", "gemini": "", "claude": "commands/review.md", "sync_mode": "append" }
  }
}"#;

fn workspace(home: &TestHome) -> Workspace {
    Workspace::open(home.path()).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_example_scenario() {
    let home = TestHome::new();
    home.write_mapping(
        r#"{"version": 1, "categories": {"global": {"sync_mode": "replace", "codex": "AGENTS.md", "gemini": "", "claude": ""}}}"#,
    );
    home.write_source("instructions/global.md", "Be concise.");
    let ws = workspace(&home);

    let preview = ws.preview_sync().unwrap();
    assert_eq!(preview.items.len(), 1);
    let item = &preview.items[0];
    assert_eq!(item.status, SyncStatus::Create);
    assert_eq!(item.before, "");
    assert_eq!(item.after, "Be concise.");

    let applied = ws.apply_sync(&[item.id.clone()]).unwrap();
    assert_eq!(applied.applied_count, 1);
    home.assert_file_eq(".codex/AGENTS.md", "Be concise.");

    let backup_id = applied.backup_id.unwrap();
    let detail = ws.get_backup_detail(&backup_id).unwrap();
    assert_eq!(detail.entries.len(), 1);
    assert!(!detail.entries[0].existed_before);
    assert_eq!(detail.entries[0].backup_content, None);

    let restored = ws.restore_backup(&backup_id).unwrap();
    assert_eq!(restored.restored_count, 1);
    home.assert_file_not_exists(".codex/AGENTS.md");
}

#[test]
fn test_second_apply_is_a_no_op() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    home.write_source("instructions/global.md", "rules");
    let ws = workspace(&home);
    let all = ws.preview_sync().unwrap().pending_ids();

    let first = ws.apply_sync(&all).unwrap();
    assert_eq!(first.applied_count, 3);
    let written = fs::metadata(home.agent_path("codex", "AGENTS.md"))
        .unwrap()
        .modified()
        .unwrap();

    let second = ws.apply_sync(&all).unwrap();
    assert_eq!(second.applied_count, 0);
    assert_eq!(second.backup_id, None);
    assert_eq!(ws.list_backups().unwrap().len(), 1);
    let after = fs::metadata(home.agent_path("codex", "AGENTS.md"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(written, after);
}

#[test]
fn test_append_never_duplicates_across_rounds() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    home.write_source("instructions/review.md", "Check error handling.");
    home.write_agent("claude", "commands/review.md", "# My review notes\n");
    let ws = workspace(&home);
    let selection = ids(&["claude:review"]);

    for _ in 0..3 {
        ws.apply_sync(&selection).unwrap();
    }

    let content = home.read_agent("claude", "commands/review.md").unwrap();
    assert_eq!(content.matches("Check error handling.").count(), 1);
    assert!(content.starts_with("# My review notes\n"));

    let item = ws
        .preview_sync()
        .unwrap()
        .get("claude:review")
        .cloned()
        .unwrap();
    assert_eq!(item.status, SyncStatus::Unchanged);
    assert_eq!(item.after, item.before);

    // Editing the source updates the block in place.
    home.write_source("instructions/review.md", "Check error handling and tests.");
    ws.apply_sync(&selection).unwrap();
    let content = home.read_agent("claude", "commands/review.md").unwrap();
    assert!(content.contains("Check error handling and tests."));
    assert!(!content.contains("Check error handling.\n"));
    assert_eq!(content.matches("aicm:block:review -->").count(), 2);
}

#[test]
fn test_restore_is_byte_identical() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    home.write_source("instructions/global.md", "new rules\n");
    home.write_agent("codex", "AGENTS.md", "old rules\r\nwith CRLF\r\n");
    let gemini_bytes: &[u8] = b"caf\xe9 latin-1\n";
    fs::create_dir_all(home.agent_path("gemini", "")).unwrap();
    fs::write(home.agent_path("gemini", "GEMINI.md"), gemini_bytes).unwrap();
    let ws = workspace(&home);

    let applied = ws
        .apply_sync(&ids(&["codex:global", "gemini:global", "claude:global"]))
        .unwrap();
    assert_eq!(applied.applied_count, 3);
    home.assert_file_eq(".gemini/GEMINI.md", "new rules\n");

    let restored = ws.restore_backup(&applied.backup_id.unwrap()).unwrap();
    assert_eq!(restored.restored_count, 3);
    assert_eq!(
        fs::read(home.agent_path("codex", "AGENTS.md")).unwrap(),
        b"old rules\r\nwith CRLF\r\n"
    );
    assert_eq!(fs::read(home.agent_path("gemini", "GEMINI.md")).unwrap(), gemini_bytes);
    home.assert_file_not_exists(".claude/CLAUDE.md");
}

#[test]
fn test_restore_count_matches_changed_files() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    home.write_source("instructions/global.md", "rules");
    home.write_agent("codex", "AGENTS.md", "rules");
    let ws = workspace(&home);

    // codex already matches, so only gemini and claude are written.
    let all = ids(&["codex:global", "gemini:global", "claude:global"]);
    let applied = ws.apply_sync(&all).unwrap();
    assert_eq!(applied.applied_count, 2);

    let backup_id = applied.backup_id.unwrap();
    assert_eq!(ws.get_backup_detail(&backup_id).unwrap().entries.len(), 2);
    assert_eq!(ws.restore_backup(&backup_id).unwrap().restored_count, 2);
    assert_eq!(ws.restore_backup(&backup_id).unwrap().restored_count, 0);
}

#[test]
fn test_external_edit_between_preview_and_apply() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    home.write_source("instructions/global.md", "rules");
    home.write_agent("codex", "AGENTS.md", "old");
    home.write_agent("claude", "CLAUDE.md", "old");
    let ws = workspace(&home);

    let preview = ws.preview_sync().unwrap();
    assert_eq!(preview.get("codex:global").unwrap().status, SyncStatus::Update);
    let selection = ids(&["codex:global", "claude:global"]);

    // Someone syncs codex by hand and edits claude differently.
    home.write_agent("codex", "AGENTS.md", "rules");
    home.write_agent("claude", "CLAUDE.md", "edited elsewhere");

    let applied = ws.apply_sync(&selection).unwrap();
    assert_eq!(applied.applied_count, 1);
    assert_eq!(applied.files, vec!["CLAUDE.md"]);

    let detail = ws.get_backup_detail(&applied.backup_id.unwrap()).unwrap();
    assert_eq!(detail.entries.len(), 1);
    assert_eq!(
        detail.entries[0].backup_content.as_deref(),
        Some("edited elsewhere")
    );
}

#[test]
fn test_backups_are_independent() {
    let home = TestHome::new();
    home.write_mapping(THREE_AGENTS);
    let ws = workspace(&home);
    let codex = ids(&["codex:global"]);

    home.write_source("instructions/global.md", "v1");
    let first = ws.apply_sync(&codex).unwrap().backup_id.unwrap();
    home.write_source("instructions/global.md", "v2");
    let second = ws.apply_sync(&codex).unwrap().backup_id.unwrap();
    let manual = ws.create_backup().unwrap();
    assert_eq!(manual.trigger, BackupTrigger::Manual);

    ws.delete_backup(&first).unwrap();
    ws.restore_backup(&second).unwrap();
    home.assert_file_eq(".codex/AGENTS.md", "v1");

    ws.restore_backup(&manual.backup_id).unwrap();
    home.assert_file_eq(".codex/AGENTS.md", "v2");

    let listed: Vec<String> = ws
        .list_backups()
        .unwrap()
        .into_iter()
        .map(|info| info.backup_id)
        .collect();
    assert_eq!(listed, vec![manual.backup_id, second]);
}
