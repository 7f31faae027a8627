//! Engine lifecycle integration tests.
//!
//! These tests drive the conversion engine with a mock codec and an
//! in-memory storage:
//! - Batch outcome counting
//! - Write-back order and naming
//! - Permission handling
//! - Re-entrancy and progress reporting

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_test::assert_ok;

use mediaswap_core::{
    testing::{
        fixtures::{folder_task, selected_task},
        MockCodec, MockStorage, StorageOp,
    },
    BatchPhase, BatchState, Classifier, CodecError, ConversionEngine, ConversionTask,
    FailureKind, ImageCodec, PermissionState, TaskOutcome,
};

type TestEngine = ConversionEngine<MockCodec, MockCodec, MockStorage>;

/// Test helper wiring an engine to shared mocks.
struct TestHarness {
    engine: TestEngine,
    codec: MockCodec,
    storage: MockStorage,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_classifier(Classifier::default())
    }

    fn with_classifier(classifier: Classifier) -> Self {
        let codec = MockCodec::new();
        let storage = MockStorage::new();
        let engine = ConversionEngine::new(
            classifier,
            codec.clone(),
            codec.clone(),
            storage.clone(),
        );

        Self {
            engine,
            codec,
            storage,
        }
    }

    async fn add(&self, path: &str, data: &[u8]) {
        self.storage.add_file(path, data).await;
    }

    async fn ops_touching(&self, path: &str) -> Vec<StorageOp> {
        let path = Path::new(path);
        self.storage
            .operations()
            .await
            .into_iter()
            .filter(|op| match op {
                StorageOp::Read(p)
                | StorageOp::WriteEntry(p)
                | StorageOp::RemoveEntry(p)
                | StorageOp::Overwrite(p) => p == path,
                _ => false,
            })
            .collect()
    }
}

/// A folder task rooted somewhere other than the fixture library.
fn task_in(dir: &str, name: &str) -> ConversionTask {
    ConversionTask::from_discovery(Path::new(dir).join(name), PathBuf::from(dir), name.to_string())
}

// =============================================================================
// Batch Outcome Tests
// =============================================================================

#[tokio::test]
async fn test_mixed_batch_counts_each_outcome() {
    let harness = TestHarness::new();
    harness.add("/library/IMG_1.HEIC", b"img").await;
    harness.add("/library/notes.txt", b"text").await;
    harness.add("/library/clip.MOV", b"broken").await;
    harness.codec.fail_on_input(b"broken").await;

    let tasks = vec![
        folder_task("IMG_1.HEIC"),
        folder_task("notes.txt"),
        folder_task("clip.MOV"),
    ];
    let report = harness.engine.process_items(&tasks).await.unwrap();

    assert_eq!(report.total_tasks, 3);
    assert_eq!(report.total_convertible, 2);
    assert_eq!(
        (report.converted, report.skipped, report.failed),
        (1, 1, 1)
    );
    assert_eq!(report.to_string(), "Done: converted 1, skipped 1, failed 1");

    assert_eq!(
        harness.storage.file("/library/IMG_1.jpg").await.unwrap(),
        b"jpeg:img"
    );
    assert!(harness.storage.file("/library/IMG_1.HEIC").await.is_none());
    assert_eq!(
        harness.storage.file("/library/notes.txt").await.unwrap(),
        b"text"
    );
    // A failed task leaves its original in place
    assert_eq!(
        harness.storage.file("/library/clip.MOV").await.unwrap(),
        b"broken"
    );
    assert!(harness.storage.file("/library/clip.mp4").await.is_none());

    let state = harness.engine.state();
    assert_eq!(state.phase, BatchPhase::Completed);
    assert_eq!(state.processed(), state.total_tasks);
}

#[tokio::test]
async fn test_records_follow_task_order() {
    let harness = TestHarness::new();
    harness.add("/library/a/clip.mov", b"v").await;
    harness.add("/library/b.heif", b"i").await;

    let tasks = vec![folder_task("a/clip.mov"), folder_task("b.heif")];
    let report = harness.engine.process_items(&tasks).await.unwrap();

    let paths: Vec<&str> = report
        .tasks
        .iter()
        .map(|r| r.relative_path.as_str())
        .collect();
    assert_eq!(paths, vec!["a/clip.mov", "b.heif"]);
    assert_eq!(
        report.tasks[0].outcome,
        TaskOutcome::Converted {
            output_name: "clip.mp4".to_string(),
            removed_original: true,
        }
    );
    assert_eq!(
        harness.storage.file("/library/a/clip.mp4").await.unwrap(),
        b"mp4:v"
    );
}

#[tokio::test]
async fn test_unsupported_files_are_never_touched() {
    let harness = TestHarness::new();
    harness.add("/library/readme.md", b"md").await;
    harness.add("/library/.hidden", b"dot").await;
    harness.add("/library/Makefile", b"make").await;

    let tasks = vec![
        folder_task("readme.md"),
        folder_task(".hidden"),
        folder_task("Makefile"),
    ];
    let report = harness.engine.process_items(&tasks).await.unwrap();

    assert_eq!(report.skipped, 3);
    assert_eq!(report.total_convertible, 0);
    assert!(harness.storage.operations().await.is_empty());
    assert_eq!(harness.codec.call_count().await, 0);
    // Skipping everything never initializes a codec
    assert_eq!(harness.codec.init_count().await, 0);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let harness = TestHarness::new();

    assert!(harness.engine.process_items(&[]).await.is_none());
    assert_eq!(harness.engine.state(), BatchState::default());
}

#[tokio::test]
async fn test_report_serializes_outcomes() {
    let harness = TestHarness::new();
    harness.add("/library/IMG_1.heic", b"img").await;
    harness.add("/library/notes.txt", b"text").await;

    let tasks = vec![folder_task("IMG_1.heic"), folder_task("notes.txt")];
    let report = harness.engine.process_items(&tasks).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tasks"][0]["class"], "image");
    assert_eq!(json["tasks"][0]["outcome"]["status"], "converted");
    assert_eq!(json["tasks"][0]["outcome"]["output_name"], "IMG_1.jpg");
    assert_eq!(json["tasks"][1]["outcome"]["status"], "skipped");
}

// =============================================================================
// Write-back Tests
// =============================================================================

#[tokio::test]
async fn test_new_entry_is_written_before_original_is_removed() {
    let harness = TestHarness::new();
    harness.add("/library/trip/IMG_7.HEIC", b"img").await;

    harness
        .engine
        .process_items(&[folder_task("trip/IMG_7.HEIC")])
        .await
        .unwrap();

    let ops = harness.storage.operations().await;
    let write = ops
        .iter()
        .position(|op| *op == StorageOp::WriteEntry(PathBuf::from("/library/trip/IMG_7.jpg")))
        .unwrap();
    let remove = ops
        .iter()
        .position(|op| *op == StorageOp::RemoveEntry(PathBuf::from("/library/trip/IMG_7.HEIC")))
        .unwrap();
    assert!(write < remove);
}

#[tokio::test]
async fn test_failed_write_keeps_original() {
    let harness = TestHarness::new();
    harness.add("/library/IMG_3.heic", b"img").await;
    harness.storage.fail_writes_to("/library/IMG_3.jpg").await;

    let report = harness
        .engine
        .process_items(&[folder_task("IMG_3.heic")])
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    match &report.tasks[0].outcome {
        TaskOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Storage),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(harness.storage.file("/library/IMG_3.heic").await.is_some());
    assert!(harness
        .ops_touching("/library/IMG_3.heic")
        .await
        .iter()
        .all(|op| !matches!(op, StorageOp::RemoveEntry(_))));
}

#[tokio::test]
async fn test_selected_file_is_overwritten_under_its_name() {
    let harness = TestHarness::new();
    harness.add("/picked/IMG_2.heic", b"img").await;

    let report = harness
        .engine
        .process_items(&[selected_task("/picked/IMG_2.heic")])
        .await
        .unwrap();

    assert_eq!(
        report.tasks[0].outcome,
        TaskOutcome::Converted {
            output_name: "IMG_2.heic".to_string(),
            removed_original: false,
        }
    );
    assert_eq!(
        harness.storage.file("/picked/IMG_2.heic").await.unwrap(),
        b"jpeg:img"
    );
    assert_eq!(harness.storage.paths().await.len(), 1);
    assert_eq!(
        harness.ops_touching("/picked/IMG_2.heic").await,
        vec![
            StorageOp::Read(PathBuf::from("/picked/IMG_2.heic")),
            StorageOp::Overwrite(PathBuf::from("/picked/IMG_2.heic")),
        ]
    );
}

#[tokio::test]
async fn test_output_name_equal_to_source_is_not_removed() {
    let harness = TestHarness::with_classifier(Classifier::new(["jpg"], ["mp4"]));
    harness.add("/library/photo.jpg", b"old").await;
    harness.add("/library/movie.MP4", b"old").await;

    let report = harness
        .engine
        .process_items(&[folder_task("photo.jpg"), folder_task("movie.MP4")])
        .await
        .unwrap();

    assert_eq!(report.converted, 2);
    assert_eq!(
        harness.storage.file("/library/photo.jpg").await.unwrap(),
        b"jpeg:old"
    );
    // Names differing only in case refer to the same file on many systems
    assert!(harness.storage.file("/library/movie.MP4").await.is_some());
    assert!(harness
        .storage
        .operations()
        .await
        .iter()
        .all(|op| !matches!(op, StorageOp::RemoveEntry(_))));
}

// =============================================================================
// Permission Tests
// =============================================================================

#[tokio::test]
async fn test_denied_permission_fails_without_reading() {
    let harness = TestHarness::new();
    harness.add("/locked/IMG_1.heic", b"img").await;
    harness
        .storage
        .set_permission("/locked", PermissionState::Denied)
        .await;

    let report = harness
        .engine
        .process_items(&[task_in("/locked", "IMG_1.heic")])
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    match &report.tasks[0].outcome {
        TaskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::PermissionDenied)
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(harness.ops_touching("/locked/IMG_1.heic").await.is_empty());
    assert_eq!(harness.codec.call_count().await, 0);
}

#[tokio::test]
async fn test_prompt_permission_is_requested_once_per_task() {
    let harness = TestHarness::new();
    harness.add("/library/IMG_1.heic", b"img").await;
    harness
        .storage
        .set_permission("/library", PermissionState::Prompt)
        .await;

    let report = harness
        .engine
        .process_items(&[folder_task("IMG_1.heic")])
        .await
        .unwrap();

    assert_eq!(report.converted, 1);
    assert_eq!(
        harness.storage.permission_requests().await,
        vec![PathBuf::from("/library")]
    );
}

#[tokio::test]
async fn test_granted_permission_is_not_requested() {
    let harness = TestHarness::new();
    harness.add("/library/IMG_1.heic", b"img").await;

    harness
        .engine
        .process_items(&[folder_task("IMG_1.heic")])
        .await
        .unwrap();

    assert!(harness.storage.permission_requests().await.is_empty());
}

#[tokio::test]
async fn test_selected_file_permission_targets_file() {
    let harness = TestHarness::new();
    harness.add("/picked/clip.mov", b"v").await;
    harness
        .storage
        .set_permission("/picked/clip.mov", PermissionState::Prompt)
        .await;
    harness.storage.set_grant_on_request(false).await;

    let report = harness
        .engine
        .process_items(&[selected_task("/picked/clip.mov")])
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(
        harness.storage.permission_requests().await,
        vec![PathBuf::from("/picked/clip.mov")]
    );
}

// =============================================================================
// Codec Tests
// =============================================================================

#[tokio::test]
async fn test_failed_initialization_is_retried_by_next_task() {
    let harness = TestHarness::new();
    harness.add("/library/a.heic", b"a").await;
    harness.add("/library/b.heic", b"b").await;
    harness
        .codec
        .set_next_init_error(CodecError::initialization("download interrupted"))
        .await;

    let report = harness
        .engine
        .process_items(&[folder_task("a.heic"), folder_task("b.heic")])
        .await
        .unwrap();

    assert_eq!((report.converted, report.failed), (1, 1));
    match &report.tasks[0].outcome {
        TaskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Codec);
            assert!(failure.message.contains("download interrupted"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(harness.codec.init_count().await, 1);
}

#[tokio::test]
async fn test_codec_initializes_once_across_batches() {
    let harness = TestHarness::new();
    harness.add("/library/a.heic", b"a").await;
    harness.add("/library/b.mov", b"b").await;

    harness
        .engine
        .process_items(&[folder_task("a.heic")])
        .await
        .unwrap();
    harness
        .engine
        .process_items(&[folder_task("b.mov")])
        .await
        .unwrap();

    assert_ok!(ImageCodec::ensure_initialized(&harness.codec).await);
    assert_eq!(harness.codec.init_count().await, 1);
}

#[tokio::test]
async fn test_one_shot_codec_error_only_fails_one_task() {
    let harness = TestHarness::new();
    harness.add("/library/a.mov", b"a").await;
    harness.add("/library/b.mov", b"b").await;
    harness.codec.set_next_error(CodecError::EmptyOutput).await;

    let report = harness
        .engine
        .process_items(&[folder_task("a.mov"), folder_task("b.mov")])
        .await
        .unwrap();

    assert_eq!((report.converted, report.failed), (1, 1));
    assert!(harness.storage.file("/library/a.mov").await.is_some());
    assert!(harness.storage.file("/library/b.mp4").await.is_some());
}

// =============================================================================
// Concurrency and Progress Tests
// =============================================================================

#[tokio::test]
async fn test_second_batch_is_ignored_while_running() {
    let harness = TestHarness::new();
    harness.add("/library/a.heic", b"a").await;
    harness
        .codec
        .set_conversion_duration(Duration::from_millis(100))
        .await;

    let tasks = vec![folder_task("a.heic")];
    let (first, second) = tokio::join!(harness.engine.process_items(&tasks), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(harness.engine.is_running());
        harness.engine.process_items(&tasks).await
    });

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(harness.codec.call_count().await, 1);
    assert!(!harness.engine.is_running());
}

#[tokio::test]
async fn test_engine_accepts_new_batch_after_completion() {
    let harness = TestHarness::new();
    harness.add("/library/a.heic", b"a").await;
    harness.add("/library/b.heic", b"b").await;

    let first = harness
        .engine
        .process_items(&[folder_task("a.heic")])
        .await
        .unwrap();
    let second = harness
        .engine
        .process_items(&[folder_task("b.heic"), folder_task("missing.heic")])
        .await
        .unwrap();

    assert_eq!(first.converted, 1);
    // Counters start over for each batch
    assert_eq!((second.converted, second.failed), (1, 1));
    assert_eq!(harness.engine.state().total_tasks, 2);
}

#[tokio::test]
async fn test_progress_snapshots_are_consistent() {
    let harness = TestHarness::new();
    for name in ["a.heic", "b.txt", "c.mov", "d.heic"] {
        harness.add(&format!("/library/{}", name), b"x").await;
    }
    harness
        .codec
        .set_conversion_duration(Duration::from_millis(10))
        .await;
    let mut rx = harness.engine.subscribe();

    let tasks: Vec<_> = ["a.heic", "b.txt", "c.mov", "d.heic"]
        .into_iter()
        .map(folder_task)
        .collect();

    let (report, seen) = tokio::join!(harness.engine.process_items(&tasks), async {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let done = state.phase == BatchPhase::Completed;
            seen.push(state);
            if done {
                break;
            }
        }
        seen
    });

    let report = report.unwrap();
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert!(pair[0].processed() <= pair[1].processed());
    }
    for state in &seen {
        assert_eq!(state.total_tasks, 4);
        assert_eq!(state.total_convertible, 3);
        assert!(state.processed() <= state.total_tasks);
    }

    let last = seen.last().unwrap();
    assert_eq!(last.phase, BatchPhase::Completed);
    assert_eq!(
        (last.converted, last.skipped, last.failed),
        (report.converted, report.skipped, report.failed)
    );
    assert_eq!(last.processed(), 4);
}

#[tokio::test]
async fn test_missing_source_is_a_storage_failure() {
    let harness = TestHarness::new();

    let report = harness
        .engine
        .process_items(&[folder_task("gone.heic")])
        .await
        .unwrap();

    match &report.tasks[0].outcome {
        TaskOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Storage),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(harness.storage.paths().await.is_empty());
}
