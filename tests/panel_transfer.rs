//! Control panel tests: list management, import/export, file store, CLI.

use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tempfile::{tempdir, NamedTempFile};

use quick_block::cli::commands;
use quick_block::engine::BlockRegistry;
use quick_block::panel::{format_relative, ExportFile};
use quick_block::store::{load_blocked_users, load_config, save_blocked_users};
use quick_block::{
    BlockError, BlockMode, BlockedUser, ButtonVisibility, ControlPanel, FileStore, ImportReport,
    MemoryStore, PersistedStore,
};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn canonical_set(users: &[BlockedUser]) -> HashSet<String> {
    users.iter().map(|u| u.canonical_username.clone()).collect()
}

fn assert_no_duplicates(users: &[BlockedUser]) {
    assert_eq!(canonical_set(users).len(), users.len(), "duplicate records: {users:?}");
}

// ==================== List Management ====================

#[tokio::test]
async fn test_load_sorts_most_recent_first() {
    let store = MemoryStore::new();
    let users = vec![
        BlockedUser::at("old", None, BlockMode::Hide, at("2024-01-01T00:00:00Z")),
        BlockedUser::at("new", None, BlockMode::Hide, at("2024-03-01T00:00:00Z")),
        BlockedUser::at("mid", None, BlockMode::Hide, at("2024-02-01T00:00:00Z")),
    ];
    save_blocked_users(&store, &users).await.unwrap();

    let panel = ControlPanel::load(Rc::new(store)).await.unwrap();
    let order: Vec<&str> = panel
        .users()
        .iter()
        .map(|u| u.display_username.as_str())
        .collect();
    assert_eq!(order, vec!["new", "mid", "old"]);
    assert_eq!(panel.stats().blocked, 3);
    assert_eq!(panel.stats().hidden_estimate, 30);
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store)).await.unwrap();
    for name in ["SpamBot", "spammer", "friend"] {
        panel.block(name, None).await.unwrap();
    }

    let hits: HashSet<&str> = panel
        .filtered("SPAM")
        .iter()
        .map(|u| u.display_username.as_str())
        .collect();
    assert_eq!(hits, HashSet::from(["SpamBot", "spammer"]));
    assert_eq!(panel.filtered("").len(), 3);
    assert!(panel.filtered("nobody").is_empty());
}

#[tokio::test]
async fn test_unblock_and_clear_replace_the_list() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    panel.block("@Alice", None).await.unwrap();
    panel.block("bob", None).await.unwrap();
    assert!(!panel.block("ALICE", None).await.unwrap());

    assert!(panel.unblock("alice").await.unwrap());
    assert!(!panel.unblock("alice").await.unwrap());
    let persisted = load_blocked_users(&store).await.unwrap();
    assert_eq!(canonical_set(&persisted), HashSet::from(["bob".to_string()]));

    assert_eq!(panel.clear_all().await.unwrap(), 1);
    assert!(load_blocked_users(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_config_changes_are_written_immediately() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    panel.set_block_mode(BlockMode::Native).await.unwrap();

    let config = load_config(&store).await.unwrap();
    assert_eq!(config.block_mode, BlockMode::Native);
    assert_eq!(config.button_visibility, ButtonVisibility::Hover);

    panel.block("carl", None).await.unwrap();
    assert_eq!(panel.users()[0].method, BlockMode::Native);
}

#[tokio::test]
async fn test_reload_picks_up_external_writes() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    let mut changes = store.subscribe();

    let registry = BlockRegistry::new(Rc::new(store.clone()));
    registry
        .add(BlockedUser::new("dora", None, BlockMode::Hide))
        .await
        .unwrap();

    let change = changes.recv().await.unwrap();
    assert!(change.touches_local("blockedUsers"));
    panel.reload().await.unwrap();
    assert_eq!(panel.users().len(), 1);
}

#[test]
fn test_relative_dates() {
    let now = at("2024-06-15T12:00:00Z");
    assert_eq!(format_relative(now - Duration::seconds(30), now), "Just now");
    assert_eq!(format_relative(now - Duration::minutes(12), now), "12m ago");
    assert_eq!(format_relative(now - Duration::days(30), now), "May 16");
}

// ==================== Import / Export ====================

#[tokio::test]
async fn test_export_then_import_round_trips() {
    let source = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(source)).await.unwrap();
    for name in ["Ann", "ben", "CAT"] {
        panel.block(name, Some(&format!("id-{name}"))).await.unwrap();
    }
    let text = panel.export(Utc::now()).to_json(true).unwrap();

    let parsed: ExportFile = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.version, "1.0");

    let target = MemoryStore::new();
    let mut fresh = ControlPanel::load(Rc::new(target.clone())).await.unwrap();
    let report = fresh.import(&text).await.unwrap();
    assert_eq!(report, ImportReport { accepted: 3, skipped: 0 });

    let imported = load_blocked_users(&target).await.unwrap();
    assert_eq!(canonical_set(&imported), canonical_set(panel.users()));
    assert!(imported.iter().any(|u| u.identity_hint == "id-CAT"));
}

#[tokio::test]
async fn test_import_is_additive_and_never_overwrites() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    panel.block("eve", Some("original")).await.unwrap();

    let text = r#"{
        "version": "1.0",
        "exportedAt": "2024-01-01T00:00:00.000Z",
        "blockedUsers": [
            {"username": "Eve", "userId": "replacement", "blockedAt": "2024-01-01T00:00:00.000Z", "method": "hide"},
            {"username": "fay", "userId": "fay", "blockedAt": "2024-01-01T00:00:00.000Z", "method": "native"},
            {"username": "FAY", "userId": "fay2", "blockedAt": "2024-01-01T00:00:00.000Z", "method": "hide"}
        ]
    }"#;
    let report = panel.import(text).await.unwrap();
    assert_eq!(report, ImportReport { accepted: 1, skipped: 2 });

    let persisted = load_blocked_users(&store).await.unwrap();
    assert_no_duplicates(&persisted);
    let eve = persisted.iter().find(|u| u.canonical_username == "eve").unwrap();
    assert_eq!(eve.identity_hint, "original");
    let fay = persisted.iter().find(|u| u.canonical_username == "fay").unwrap();
    assert_eq!(fay.method, BlockMode::Native);
}

#[tokio::test]
async fn test_import_with_nothing_new_writes_nothing() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    panel.block("gus", None).await.unwrap();
    let writes = store.write_count();

    let report = panel
        .import(r#"{"blockedUsers": [{"username": "GUS"}]}"#)
        .await
        .unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(store.write_count(), writes);
}

#[tokio::test]
async fn test_malformed_import_aborts_atomically() {
    let store = MemoryStore::new();
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    panel.block("hana", None).await.unwrap();
    let writes = store.write_count();

    for bad in [
        "not json at all",
        r#"{"version": "1.0"}"#,
        r#"{"blockedUsers": "hana"}"#,
        r#"{"blockedUsers": [{"username": "ok"}, {"method": "hide"}]}"#,
        r#"{"blockedUsers": [{"username": "ok"}, 42]}"#,
    ] {
        let err = panel.import(bad).await.unwrap_err();
        assert!(matches!(err, BlockError::InvalidImport(_)), "{bad}: {err}");
    }

    assert_eq!(store.write_count(), writes);
    assert_eq!(panel.users().len(), 1);
    assert_eq!(load_blocked_users(&store).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dedup_invariant_under_random_operations() {
    let store = MemoryStore::new();
    let registry = BlockRegistry::new(Rc::new(store.clone()));
    let mut panel = ControlPanel::load(Rc::new(store.clone())).await.unwrap();
    let names = ["ada", "Ada", "ADA", "bo", "Bo", "cy", "dee", "@dee", "eli"];
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let name = *names.choose(&mut rng).unwrap();
        match rng.gen_range(0..4) {
            0 => {
                registry
                    .add(BlockedUser::new(name, None, BlockMode::Hide))
                    .await
                    .unwrap();
            }
            1 => {
                panel.reload().await.unwrap();
                panel.block(name, None).await.unwrap();
            }
            2 => {
                let batch: Vec<BlockedUser> = (0..rng.gen_range(1..5))
                    .map(|_| BlockedUser::new(names.choose(&mut rng).unwrap(), None, BlockMode::Hide))
                    .collect();
                let text = ExportFile::new(batch, Utc::now()).to_json(false).unwrap();
                panel.reload().await.unwrap();
                panel.import(&text).await.unwrap();
            }
            _ => {
                registry.remove(name).await.unwrap();
            }
        }
        assert_no_duplicates(&load_blocked_users(&store).await.unwrap());
    }
}

// ==================== File Store ====================

#[tokio::test]
async fn test_file_store_persists_across_opens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    {
        let mut panel = ControlPanel::load(Rc::new(FileStore::new(&path))).await.unwrap();
        panel.block("ivy", Some("42")).await.unwrap();
    }

    let store = FileStore::new(&path);
    let users = load_blocked_users(&store).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].identity_hint, "42");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["blockedUsers"][0]["canonicalUsername"], "ivy");

    store.remove("blockedUsers").await.unwrap();
    assert!(load_blocked_users(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_file() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{ not json").unwrap();
    let store = FileStore::new(file.path());
    assert!(matches!(
        load_blocked_users(&store).await,
        Err(BlockError::Json(_))
    ));
}

// ==================== CLI Commands ====================

#[tokio::test]
async fn test_cli_commands_round_trip() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("store.json");

    commands::cmd_block(&store_path, "@Jade", None, false).await.unwrap();
    commands::cmd_block(&store_path, "kai", Some("k-1"), true).await.unwrap();
    commands::cmd_config(&store_path, Some("native"), Some("always"), false)
        .await
        .unwrap();
    commands::cmd_list(&store_path, Some("ja"), false).await.unwrap();
    commands::cmd_stats(&store_path, true).await.unwrap();

    let export_path = dir.path().join("export.json");
    commands::cmd_export(&store_path, Some(export_path.as_path()), false)
        .await
        .unwrap();
    let exported: ExportFile =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(exported.blocked_users.len(), 2);

    commands::cmd_clear(&store_path, true, false).await.unwrap();
    commands::cmd_import(&store_path, &export_path, false).await.unwrap();

    let store = FileStore::new(&store_path);
    let users = load_blocked_users(&store).await.unwrap();
    assert_eq!(
        canonical_set(&users),
        HashSet::from(["jade".to_string(), "kai".to_string()])
    );
    let config = load_config(&store).await.unwrap();
    assert_eq!(config.block_mode, BlockMode::Native);
    assert_eq!(config.button_visibility, ButtonVisibility::Always);
}

#[tokio::test]
async fn test_cli_errors_map_to_variants() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("store.json");

    let err = commands::cmd_unblock(&store_path, "nobody", false)
        .await
        .unwrap_err();
    assert!(matches!(err, BlockError::NotFound(_)));

    let err = commands::cmd_clear(&store_path, false, false).await.unwrap_err();
    assert!(matches!(err, BlockError::InvalidArgument(_)));

    let err = commands::cmd_config(&store_path, Some("mute"), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, BlockError::InvalidArgument(_)));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"blockedUsers": 7}"#).unwrap();
    let err = commands::cmd_import(&store_path, &bad, false).await.unwrap_err();
    assert!(matches!(err, BlockError::InvalidImport(_)));
}
