//! E2E tests for several instances sharing one store and one source file

use crate::common::fixtures::{scratch_files, Workspace};
use jsonl_record::{SaveOutcome, StateStore};

/// Two instances open the same line without colliding
#[tokio::test]
async fn test_same_line_in_two_instances() {
    let ws = Workspace::three_records();
    let (mut a, _host_a) = ws.editor().await;
    let (mut b, _host_b) = ws.editor().await;
    assert_ne!(a.instance(), b.instance());
    assert_ne!(a.scratch_dir(), b.scratch_dir());

    let in_a = a.open(&ws.source, Some(2), None).await.unwrap();
    let in_b = b.open(&ws.source, Some(2), None).await.unwrap();
    assert_ne!(in_a.surface, in_b.surface);
    assert!(in_a.surface.path().starts_with(a.scratch_dir()));
    assert!(in_b.surface.path().starts_with(b.scratch_dir()));

    // Both entries end up in the shared map
    let stored = ws.store.get(&a.config().store_key).await.unwrap().unwrap();
    let stored = stored.as_object().unwrap();
    assert!(stored.contains_key(in_a.surface.as_str()));
    assert!(stored.contains_key(in_b.surface.as_str()));
}

/// Closing in one instance leaves the other instance's surface alone
#[tokio::test]
async fn test_close_in_one_instance_keeps_other() {
    let ws = Workspace::three_records();
    let (mut a, _host_a) = ws.editor().await;
    let (mut b, _host_b) = ws.editor().await;
    let in_a = a.open(&ws.source, Some(1), None).await.unwrap();
    let in_b = b.open(&ws.source, Some(1), None).await.unwrap();

    a.close(&in_a.surface).await.unwrap();

    assert!(b.session(&in_b.surface).is_some());
    assert!(in_b.surface.path().exists());
    let stored = ws.store.get(&b.config().store_key).await.unwrap().unwrap();
    let stored = stored.as_object().unwrap();
    assert!(!stored.contains_key(in_a.surface.as_str()));
    assert!(stored.contains_key(in_b.surface.as_str()));

    b.save(&in_b.surface, "{\"id\":\"b\"}").await.unwrap();
    assert_eq!(ws.source_lines()[0], "{\"id\":\"b\"}");
}

/// Loading only recovers the instance's own partition
#[tokio::test]
async fn test_restart_loads_own_partition_only() {
    let ws = Workspace::three_records();
    let (mut a, _host_a) = ws.editor().await;
    let (mut b, _host_b) = ws.editor().await;
    let in_a = a.open(&ws.source, Some(1), None).await.unwrap();
    let in_b = b.open(&ws.source, Some(3), None).await.unwrap();
    let instance_a = a.instance().clone();
    drop(a);

    let (restarted, _host) = ws.editor_for(&instance_a).await;
    assert_eq!(restarted.registry().len(), 1);
    assert!(restarted.session(&in_a.surface).is_some());
    assert!(restarted.session(&in_b.surface).is_none());
}

/// Teardown of one instance keeps every other instance's entries and files
#[tokio::test]
async fn test_deactivate_preserves_other_instances() {
    let ws = Workspace::three_records();
    let (mut a, _host_a) = ws.editor().await;
    let (mut b, _host_b) = ws.editor().await;
    a.open(&ws.source, Some(1), None).await.unwrap();
    let in_b = b.open(&ws.source, Some(2), None).await.unwrap();

    let report = a.deactivate().await.unwrap();
    assert_eq!(report.mappings_removed, 1);
    assert!(scratch_files(a.scratch_dir()).is_empty());
    assert_eq!(scratch_files(b.scratch_dir()), vec![in_b.surface.path()]);

    let stored = ws.store.get(&b.config().store_key).await.unwrap().unwrap();
    let stored = stored.as_object().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored.contains_key(in_b.surface.as_str()));
    assert!(b.session(&in_b.surface).is_some());
}

/// Saves made by each instance land on their own lines
#[tokio::test]
async fn test_interleaved_saves() {
    let ws = Workspace::three_records();
    let (mut a, _host_a) = ws.editor().await;
    let (mut b, _host_b) = ws.editor().await;
    let in_a = a.open(&ws.source, Some(1), None).await.unwrap();
    let in_b = b.open(&ws.source, Some(3), None).await.unwrap();

    let saved = a.save(&in_a.surface, "{\"by\":\"a\"}").await.unwrap();
    assert!(matches!(saved, SaveOutcome::Saved { line: 1, .. }));
    b.save(&in_b.surface, "{\"by\":\"b\"}").await.unwrap();

    assert_eq!(
        ws.source_lines(),
        vec!["{\"by\":\"a\"}", "{\"id\":2}", "{\"by\":\"b\"}"]
    );
}
