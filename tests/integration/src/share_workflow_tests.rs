//! Moving a configuration between two homes with share packages.

use aicm_core::{BackupTrigger, ImportFileStatus, SyncStatus, Workspace};
use aicm_test_utils::TestHome;
use pretty_assertions::assert_eq;

const NOTES_MAPPING: &str = r#"{
  "version": 1,
  "categories": {
    "global": { "codex": "AGENTS.md", "gemini": "GEMINI.md", "claude": "CLAUDE.md" },
    "notes": { "codex": "", "gemini": "", "claude": "NOTES.md", "sync_mode": "append" }
  }
}"#;

#[test]
fn test_author_to_recipient_round_trip() {
    let author = TestHome::new();
    author.write_mapping(NOTES_MAPPING);
    author.write_source("instructions/global.md", "Shared rules.\n");
    author.write_source("instructions/notes.md", "Team notes.\n");
    author.write_source(
        "env/agent.env",
        "export ANTHROPIC_API_KEY=sk-ant-REDACTED\n",
    );
    let author_ws = Workspace::open(author.path()).unwrap();
    let out = tempfile::tempdir().unwrap();
    let zip = out.path().join("team.zip");

    let exported = author_ws.export_share_package_to(&zip, true).unwrap();
    assert_eq!(exported.files, 3);
    assert_eq!(exported.redactions, 1);

    let recipient = TestHome::new();
    recipient.write_agent("claude", "NOTES.md", "# Personal\n");
    let ws = Workspace::open(recipient.path()).unwrap();
    ws.init_workspace().unwrap();

    let preview = ws.preview_import_package(&zip).unwrap();
    assert!(preview.has_mapping);
    assert!(
        preview
            .files
            .iter()
            .all(|file| file.status == ImportFileStatus::Create)
    );

    // init wrote a default mapping, so the archived one needs overwrite.
    let imported = ws.apply_import_package(&zip, true).unwrap();
    assert_eq!(imported.applied_count, 3);
    assert!(imported.mapping_applied);
    let import_backup = imported.backup_id.expect("mapping pre-image is backed up");

    let sync = ws.preview_sync().unwrap();
    assert_eq!(sync.items.len(), 4);
    assert_eq!(sync.get("claude:notes").unwrap().status, SyncStatus::Append);
    assert_eq!(sync.get("codex:global").unwrap().status, SyncStatus::Create);

    ws.apply_sync(&sync.pending_ids()).unwrap();
    recipient.assert_file_eq(".codex/AGENTS.md", "Shared rules.\n");
    recipient.assert_file_contains(".claude/NOTES.md", "# Personal\n");
    recipient.assert_file_contains(".claude/NOTES.md", "Team notes.");
    assert_eq!(
        recipient.read_source("env/agent.env").as_deref(),
        Some("export ANTHROPIC_API_KEY=[REDACTED]\n")
    );

    // Rolling back the import restores the default mapping.
    ws.restore_backup(&import_backup).unwrap();
    assert_eq!(ws.get_mapping().unwrap().category_names(), vec!["global", "mcp"]);
}

#[test]
fn test_reimport_without_overwrite_keeps_local_edits() {
    let author = TestHome::new();
    author.write_source("instructions/global.md", "v1");
    let out = tempfile::tempdir().unwrap();
    let zip = out.path().join("share.zip");
    Workspace::open(author.path())
        .unwrap()
        .export_share_package_to(&zip, false)
        .unwrap();

    let home = TestHome::new();
    let ws = Workspace::open(home.path()).unwrap();
    ws.apply_import_package(&zip, false).unwrap();
    ws.save_scope_file(aicm_core::Scope::Source, "instructions/global.md", "local")
        .unwrap();

    let again = ws.apply_import_package(&zip, false).unwrap();
    assert_eq!(again.applied_count, 0);
    assert_eq!(again.skipped_count, 1);
    assert!(!again.mapping_applied);
    assert_eq!(home.read_source("instructions/global.md").as_deref(), Some("local"));

    let forced = ws.apply_import_package(&zip, true).unwrap();
    assert_eq!(forced.applied_count, 1);
    assert_eq!(home.read_source("instructions/global.md").as_deref(), Some("v1"));

    let backups = ws.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].trigger, BackupTrigger::Import);
    ws.restore_backup(&backups[0].backup_id).unwrap();
    assert_eq!(home.read_source("instructions/global.md").as_deref(), Some("local"));
}
