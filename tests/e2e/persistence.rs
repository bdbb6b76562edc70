//! E2E tests for session recovery across restarts and for teardown

use crate::common::fake_host::FakeHost;
use crate::common::fixtures::{scratch_files, Workspace};
use jsonl_record::{Config, JsonFileStateStore, MessageLevel, RecordEditor, StateStore};
use serde_json::Value;
use std::sync::Arc;

/// A restarted instance picks up its sessions and can still save through them
#[tokio::test]
async fn test_restart_restores_sessions() {
    let ws = Workspace::three_records();
    let (mut editor, _host) = ws.editor().await;
    let opened = editor.open(&ws.source, Some(2), None).await.unwrap();
    let instance = editor.instance().clone();
    drop(editor);

    let (mut restarted, _host) = ws.editor_for(&instance).await;
    assert_eq!(restarted.registry().len(), 1);
    let session = restarted.session(&opened.surface).unwrap();
    assert_eq!(session.line_number, 2);
    assert!(session.is_owned_by(&instance));

    restarted.save(&opened.surface, "{\"id\":\"restored\"}").await.unwrap();
    assert_eq!(ws.source_lines()[1], "{\"id\":\"restored\"}");
}

/// Sessions whose surface file vanished while the instance was down are pruned
#[tokio::test]
async fn test_restart_prunes_missing_surfaces() {
    let ws = Workspace::three_records();
    let (mut editor, _host) = ws.editor().await;
    let kept = editor.open(&ws.source, Some(1), None).await.unwrap();
    let lost = editor.open(&ws.source, Some(3), None).await.unwrap();
    let instance = editor.instance().clone();
    drop(editor);

    std::fs::remove_file(lost.surface.path()).unwrap();

    let (restarted, _host) = ws.editor_for(&instance).await;
    assert!(restarted.session(&kept.surface).is_some());
    assert!(restarted.session(&lost.surface).is_none());

    // The pruned entry is gone from storage too
    let stored = ws.store.get(&restarted.config().store_key).await.unwrap().unwrap();
    let stored = stored.as_object().unwrap();
    assert!(stored.contains_key(kept.surface.as_str()));
    assert!(!stored.contains_key(lost.surface.as_str()));
}

/// Entries that cannot be read as sessions are skipped on load
#[tokio::test]
async fn test_restart_skips_malformed_entries() {
    let ws = Workspace::three_records();
    let (mut editor, _host) = ws.editor().await;
    let opened = editor.open(&ws.source, Some(1), None).await.unwrap();
    let instance = editor.instance().clone();
    let key = editor.config().store_key.clone();
    drop(editor);

    let mut stored = ws.store.get(&key).await.unwrap().unwrap();
    stored.as_object_mut().unwrap().insert(
        "/tmp/garbage.json".to_string(),
        serde_json::json!({ "ownerInstanceId": instance.as_str(), "lineNumber": "nope" }),
    );
    ws.store.set(&key, stored).await.unwrap();

    let (restarted, _host) = ws.editor_for(&instance).await;
    assert_eq!(restarted.registry().len(), 1);
    assert!(restarted.session(&opened.surface).is_some());
}

/// Teardown removes scratch files, the scratch directory and this partition
#[tokio::test]
async fn test_deactivate_cleans_up() {
    let ws = Workspace::three_records();
    let (mut editor, _host) = ws.editor().await;
    editor.open(&ws.source, Some(1), None).await.unwrap();
    editor.open(&ws.source, Some(2), None).await.unwrap();
    let scratch = editor.scratch_dir().to_path_buf();
    assert_eq!(scratch_files(&scratch).len(), 2);

    let report = editor.deactivate().await.unwrap();
    assert_eq!(report.scratch.removed, 2);
    assert_eq!(report.scratch.failed, 0);
    assert!(report.scratch.dir_removed);
    assert_eq!(report.mappings_removed, 2);
    assert!(!scratch.exists());
    assert!(editor.registry().is_empty());

    let stored = ws.store.get(&editor.config().store_key).await.unwrap().unwrap();
    assert!(stored.as_object().unwrap().is_empty());

    // The source is never touched by teardown
    assert_eq!(ws.source_text(), "{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n");
}

/// The file-backed store survives a full process restart
#[tokio::test]
async fn test_file_store_restart() {
    let ws = Workspace::three_records();
    let state_file = ws.dir.path().join("state").join("workspace-state.json");
    let config = Config {
        state_file: Some(state_file.clone()),
        ..ws.config()
    };

    let store: Arc<dyn StateStore> = Arc::new(JsonFileStateStore::new(config.state_file_path().unwrap()));
    let host = Arc::new(FakeHost::new());
    let mut editor = RecordEditor::activate(config.clone(), store, host).await.unwrap();
    let opened = editor.open(&ws.source, Some(3), None).await.unwrap();
    let instance = editor.instance().clone();
    drop(editor);

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&state_file).unwrap()).unwrap();
    let entry = &on_disk[config.store_key.as_str()][opened.surface.as_str()];
    assert_eq!(entry["lineNumber"], 3);
    assert_eq!(entry["ownerInstanceId"], instance.as_str());

    let store: Arc<dyn StateStore> = Arc::new(JsonFileStateStore::new(&state_file));
    let host = Arc::new(FakeHost::new());
    let restarted = RecordEditor::with_instance(instance, config, store, host)
        .await
        .unwrap();
    assert_eq!(restarted.session(&opened.surface).unwrap().line_number, 3);
}

/// A truncated state file does not stop the instance; the next save replaces it
#[tokio::test]
async fn test_truncated_state_file_is_replaced() {
    let ws = Workspace::three_records();
    let state_file = ws.dir.path().join("workspace-state.json");
    std::fs::write(&state_file, "{\"jsonlViewerTempFileMap\": {").unwrap();
    let config = Config {
        state_file: Some(state_file.clone()),
        ..ws.config()
    };

    let store: Arc<dyn StateStore> = Arc::new(JsonFileStateStore::new(&state_file));
    let host = Arc::new(FakeHost::new());
    let mut editor = RecordEditor::activate(config.clone(), store, host).await.unwrap();
    assert!(editor.registry().is_empty());

    let opened = editor.open(&ws.source, Some(2), None).await.unwrap();
    assert_eq!(opened.content, "{\n  \"id\": 2\n}");

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&state_file).unwrap()).unwrap();
    assert_eq!(on_disk[config.store_key.as_str()][opened.surface.as_str()]["lineNumber"], 2);
}

/// Activation succeeds and tells the user when the scratch directory cannot be made
#[tokio::test]
async fn test_activate_with_unusable_scratch_root() {
    let ws = Workspace::three_records();
    let blocker = ws.dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let config = Config {
        scratch_root: blocker.join("scratch"),
        ..ws.config()
    };

    let host = Arc::new(FakeHost::new());
    let editor = RecordEditor::activate(config, ws.store(), host.clone()).await;
    assert!(editor.is_ok());
    assert_eq!(
        host.messages_at(MessageLevel::Error),
        vec!["Unable to create temporary directory. Record editing may not work properly.".to_string()]
    );
}
