// tests/change_source.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use respawn::types::ChangeKind;
use respawn::watch::{ChangeBatch, ChangeFilter, ChangeSource, ChangeStream, StopSignal};
use respawn_test_utils::builders::{fast_watch, only};
use respawn_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

fn watched_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn stream_for(root: &Path, filter: ChangeFilter, debounce_ms: u64) -> (ChangeStream, StopSignal) {
    let stop = StopSignal::new();
    let source = ChangeSource::new([root.to_path_buf()], filter, fast_watch(debounce_ms));
    let stream = source.stream(stop.clone()).unwrap();
    (stream, stop)
}

async fn next_non_empty(stream: &mut ChangeStream) -> ChangeBatch {
    loop {
        let batch = stream.next_batch().await.expect("stream ended early");
        if !batch.is_empty() {
            return batch;
        }
    }
}

#[tokio::test]
async fn idle_watch_yields_empty_batches() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let (mut stream, _stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 300);

    let batch = with_timeout(stream.next_batch()).await;
    assert_eq!(batch, Some(ChangeBatch::new()));
}

#[tokio::test]
async fn changes_within_one_window_are_coalesced() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let (mut stream, _stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 1_600);

    let writer = {
        let root = root.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(root.join("a.txt"), "one").unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            fs::write(root.join("b.txt"), "two").unwrap();
        })
    };

    let batch = with_timeout(next_non_empty(&mut stream)).await;
    writer.await.unwrap();

    let paths: Vec<&Path> = batch.iter().map(|c| c.path.as_path()).collect();
    assert!(paths.contains(&root.join("a.txt").as_path()), "{batch:?}");
    assert!(paths.contains(&root.join("b.txt").as_path()), "{batch:?}");
}

#[tokio::test]
async fn repeated_writes_to_one_file_yield_exactly_one_batch() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let target = root.join("a.txt");
    let (mut stream, _stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 1_600);

    let writer = {
        let target = target.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(&target, "one").unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            fs::write(&target, "two").unwrap();
        })
    };

    let batch = with_timeout(next_non_empty(&mut stream)).await;
    writer.await.unwrap();
    assert!(batch.iter().all(|c| c.path == target), "{batch:?}");

    for _ in 0..5 {
        let later = with_timeout(stream.next_batch()).await.unwrap();
        assert!(later.is_empty(), "second batch for one burst: {later:?}");
    }
}

#[tokio::test]
async fn filtered_out_files_produce_no_changes() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let (mut stream, _stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 200);

    fs::write(root.join("notes.md"), "ignored").unwrap();
    fs::write(root.join(".hidden.txt"), "ignored").unwrap();

    for _ in 0..5 {
        let batch = with_timeout(stream.next_batch()).await.unwrap();
        assert!(batch.is_empty(), "unexpected changes: {batch:?}");
    }
}

#[tokio::test]
async fn excluded_directories_are_ignored() {
    init_tracing();
    let (_dir, root) = watched_dir();
    fs::create_dir(root.join("build")).unwrap();
    let filter = ChangeFilter::with_base(&only("*.txt").exclude("build"), &root).unwrap();
    let (mut stream, _stop) = stream_for(&root, filter, 200);

    fs::write(root.join("build").join("out.txt"), "ignored").unwrap();
    for _ in 0..3 {
        let batch = with_timeout(stream.next_batch()).await.unwrap();
        assert!(batch.is_empty(), "unexpected changes: {batch:?}");
    }

    fs::write(root.join("kept.txt"), "seen").unwrap();
    let batch = with_timeout(next_non_empty(&mut stream)).await;
    assert!(batch.iter().all(|c| c.path == root.join("kept.txt")), "{batch:?}");
}

#[tokio::test]
async fn deletions_are_reported() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let victim = root.join("gone.txt");
    fs::write(&victim, "bye").unwrap();
    let (mut stream, _stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 200);

    fs::remove_file(&victim).unwrap();

    let batch = with_timeout(next_non_empty(&mut stream)).await;
    assert!(
        batch.iter().any(|c| c.kind == ChangeKind::Deleted && c.path == victim),
        "{batch:?}"
    );
}

#[tokio::test]
async fn stop_signal_ends_the_stream_for_good() {
    init_tracing();
    let (_dir, root) = watched_dir();
    let (mut stream, stop) = stream_for(&root, ChangeFilter::new(&only("*.txt")).unwrap(), 200);

    stop.raise();

    assert_eq!(with_timeout(stream.next_batch()).await, None);
    assert!(stream.is_finished());
    assert_eq!(with_timeout(stream.next_batch()).await, None);
}

#[tokio::test]
async fn nested_roots_collapse_into_the_outer_one() {
    init_tracing();
    let (_dir, root) = watched_dir();
    fs::create_dir(root.join("src")).unwrap();

    let source = ChangeSource::new(
        [root.join("src"), root.clone()],
        ChangeFilter::new(&only("*.txt")).unwrap(),
        fast_watch(200),
    );

    assert_eq!(source.roots(), &[root]);
}
