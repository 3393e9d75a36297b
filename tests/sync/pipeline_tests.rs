// End-to-end tests: filter pipeline + engine, driven by channel sources

use std::fs;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use watchfs::sync::{
    ChangeCacheFilter, ChangeEvent, CombinedFilter, EventFilter, ExcludeFilter, Orchestrator,
    resolve_mappings, SyncAction,
};

use crate::common::{read, Workspace};

fn accepted(filter: &dyn EventFilter, batch: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    batch.into_iter().filter(|event| filter.accept(event)).collect()
}

fn copies(actions: &[SyncAction]) -> usize {
    actions
        .iter()
        .filter(|action| matches!(action, SyncAction::Copied { .. }))
        .count()
}

#[tokio::test]
async fn test_created_file_reaches_destination() {
    let ws = Workspace::new();
    fs::write(ws.src.join("a.txt"), "hi").unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(vec![ChangeEvent::added(ws.src.join("a.txt"))]).unwrap();
    drop(tx);

    let stats = ws.engine().run(rx, CancellationToken::new()).await;

    assert_eq!(stats.files_copied, 1);
    assert_eq!(read(&ws.dst.join("a.txt")).as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_deleted_file_leaves_destination() {
    let ws = Workspace::new();
    let engine = ws.engine();
    fs::write(ws.src.join("a.txt"), "hi").unwrap();
    engine.apply(&ChangeEvent::added(ws.src.join("a.txt"))).unwrap();
    assert!(ws.dst.join("a.txt").is_file());

    fs::remove_file(ws.src.join("a.txt")).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(vec![ChangeEvent::deleted(ws.src.join("a.txt"))]).unwrap();
    drop(tx);

    let stats = engine.run(rx, CancellationToken::new()).await;

    assert_eq!(stats.events, 1);
    assert_eq!(stats.files_deleted, 1);
    assert!(!ws.dst.join("a.txt").exists());
}

#[tokio::test]
async fn test_cancelled_engine_ignores_pending_batches() {
    let ws = Workspace::new();
    fs::write(ws.src.join("a.txt"), "hi").unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(vec![ChangeEvent::added(ws.src.join("a.txt"))]).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = ws.engine().run(rx, cancel).await;

    assert_eq!(stats.events, 0);
    assert!(!ws.dst.join("a.txt").exists());
    drop(tx);
}

#[test]
fn test_directory_delete_removes_children_first() {
    let ws = Workspace::new();
    let engine = ws.engine();
    fs::create_dir(ws.src.join("sub")).unwrap();
    fs::write(ws.src.join("sub/x.txt"), "x").unwrap();
    engine.apply(&ChangeEvent::added(ws.src.join("sub"))).unwrap();
    assert!(ws.dst.join("sub/x.txt").is_file());

    fs::remove_dir_all(ws.src.join("sub")).unwrap();
    let actions = engine.apply(&ChangeEvent::deleted(ws.src.join("sub"))).unwrap();

    assert_eq!(
        actions,
        vec![
            SyncAction::Removed { path: ws.dst.join("sub/x.txt") },
            SyncAction::RemovedDir { path: ws.dst.join("sub") },
        ]
    );
    assert!(!ws.dst.join("sub").exists());
}

#[test]
fn test_excluded_directory_never_mirrored() {
    let ws = Workspace::new();
    fs::create_dir(ws.src.join("ignored")).unwrap();
    fs::write(ws.src.join("ignored/file.txt"), "secret").unwrap();
    fs::write(ws.src.join("keep.txt"), "keep").unwrap();
    let filter = CombinedFilter::new(vec![Box::new(
        ExcludeFilter::from_cli_arg(ws.src.join("ignored").to_str().unwrap()).unwrap(),
    )]);

    let batch = accepted(
        &filter,
        vec![
            ChangeEvent::added(ws.src.join("ignored/file.txt")),
            ChangeEvent::added(ws.src.join("keep.txt")),
        ],
    );
    assert_eq!(batch, vec![ChangeEvent::added(ws.src.join("keep.txt"))]);

    ws.engine().apply_batch(&batch);

    assert!(!ws.dst.join("ignored").exists());
    assert_eq!(read(&ws.dst.join("keep.txt")).as_deref(), Some("keep"));
}

#[test]
fn test_identical_modifications_mirror_once() {
    let ws = Workspace::new();
    let engine = ws.engine();
    let filter = ChangeCacheFilter::new();
    let file = ws.src.join("a.txt");
    fs::write(&file, "same").unwrap();

    let mut actions = Vec::new();
    for event in accepted(
        &filter,
        vec![ChangeEvent::modified(&file), ChangeEvent::modified(&file)],
    ) {
        actions.extend(engine.apply(&event).unwrap());
    }

    assert_eq!(copies(&actions), 1);
    assert_eq!(actions.len(), 1);
}

#[test]
fn test_changed_modifications_mirror_twice() {
    let ws = Workspace::new();
    let engine = ws.engine();
    let filter = ChangeCacheFilter::new();
    let file = ws.src.join("a.txt");
    let mut actions = Vec::new();

    fs::write(&file, "first").unwrap();
    if filter.accept(&ChangeEvent::modified(&file)) {
        actions.extend(engine.apply(&ChangeEvent::modified(&file)).unwrap());
    }
    fs::write(&file, "second").unwrap();
    if filter.accept(&ChangeEvent::modified(&file)) {
        actions.extend(engine.apply(&ChangeEvent::modified(&file)).unwrap());
    }

    assert_eq!(copies(&actions), 2);
    assert_eq!(read(&ws.dst.join("a.txt")).as_deref(), Some("second"));
}

#[test]
fn test_repeated_add_is_byte_identical() {
    let ws = Workspace::new();
    let engine = ws.engine();
    let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    fs::write(ws.src.join("blob.bin"), &payload).unwrap();
    let event = ChangeEvent::added(ws.src.join("blob.bin"));

    engine.apply(&event).unwrap();
    let once = fs::read(ws.dst.join("blob.bin")).unwrap();
    engine.apply(&event).unwrap();
    let twice = fs::read(ws.dst.join("blob.bin")).unwrap();

    assert_eq!(once, payload);
    assert_eq!(twice, once);
}

#[tokio::test]
async fn test_shared_cache_across_mappings() {
    let ws = Workspace::new();
    let other_src = ws.root.join("other_src");
    let other_dst = ws.root.join("other_dst");
    fs::create_dir(&other_src).unwrap();
    fs::create_dir(&other_dst).unwrap();
    fs::write(ws.src.join("a.txt"), "a").unwrap();
    fs::write(other_src.join("b.txt"), "b").unwrap();

    let filter: Arc<dyn EventFilter> =
        Arc::new(CombinedFilter::new(vec![Box::new(ChangeCacheFilter::new())]));
    let mut mappings = vec![ws.mapping()];
    let raw = format!("{}:{}", other_src.display(), other_dst.display());
    mappings.extend(resolve_mappings(&[raw]).unwrap());

    let (tx1, rx1) = mpsc::unbounded_channel();
    let (tx2, rx2) = mpsc::unbounded_channel();
    let a = ChangeEvent::added(ws.src.join("a.txt"));
    let b = ChangeEvent::added(other_src.join("b.txt"));
    tx1.send(accepted(filter.as_ref(), vec![a.clone(), a])).unwrap();
    tx2.send(accepted(filter.as_ref(), vec![b.clone(), b])).unwrap();
    drop((tx1, tx2));

    let results = Orchestrator::new(mappings, Arc::clone(&filter))
        .with_reporting(false)
        .run_with_sources(vec![rx1, rx2], CancellationToken::new())
        .await;

    assert_eq!(results.len(), 2);
    for (_, stats) in &results {
        assert_eq!(stats.events, 1);
        assert_eq!(stats.files_copied, 1);
    }
    assert_eq!(read(&ws.dst.join("a.txt")).as_deref(), Some("a"));
    assert_eq!(read(&other_dst.join("b.txt")).as_deref(), Some("b"));
}
