//! Background worker integration tests.
//!
//! These tests verify the polling worker around the pipeline:
//! - Claiming pending lessons and driving them to completion
//! - Recovering lessons a previous run left in processing
//! - Leaving lessons without an upload alone
//! - Start/stop lifecycle and idempotency

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use lectern_core::{
    PipelineConfig, PipelineWorker, SqliteLessonStore, VideoPipeline, VideoStatus, WorkerConfig,
    lesson::LessonStore,
    testing::{fixtures, MockTranscoder},
};

/// Test helper wiring a worker to an in-memory store and mock transcoder.
struct WorkerHarness {
    worker: PipelineWorker<MockTranscoder>,
    store: Arc<SqliteLessonStore>,
    storage: TempDir,
}

impl WorkerHarness {
    fn new() -> Self {
        let storage = TempDir::new().expect("Failed to create temp dir");
        let pipeline_config = PipelineConfig::default()
            .with_storage_root(storage.path())
            .with_backoff_secs(0);
        let worker_config = WorkerConfig {
            enabled: true,
            poll_interval_ms: 25,
            max_concurrent: 2,
        };

        let store =
            Arc::new(SqliteLessonStore::in_memory().expect("Failed to create lesson store"));
        let transcoder = Arc::new(MockTranscoder::new());
        let pipeline = Arc::new(VideoPipeline::new(
            pipeline_config,
            transcoder,
            Arc::clone(&store) as Arc<dyn LessonStore>,
        ));
        let worker = PipelineWorker::new(
            worker_config,
            pipeline,
            Arc::clone(&store) as Arc<dyn LessonStore>,
        );

        Self {
            worker,
            store,
            storage,
        }
    }

    fn create_lesson(&self, video_path: Option<&str>) -> i64 {
        let request = match video_path {
            Some(path) => fixtures::lesson_with_video("Worker lesson", path),
            None => fixtures::lesson_without_video("Worker lesson"),
        };
        self.store.create(request).expect("Failed to create lesson").id
    }

    fn write_source(&self, relative_path: &str, content: &[u8]) {
        let path = self.storage.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create source dir");
        }
        std::fs::write(&path, content).expect("Failed to write source file");
    }

    fn status(&self, lesson_id: i64) -> VideoStatus {
        self.store
            .get(lesson_id)
            .expect("Failed to query lesson")
            .expect("lesson should exist")
            .video_status
    }

    async fn wait_for_status(&self, lesson_id: i64, wanted: VideoStatus) -> bool {
        for _ in 0..200 {
            if self.status(lesson_id) == wanted {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        false
    }
}

#[tokio::test]
async fn test_worker_claims_and_completes_pending_lesson() {
    let harness = WorkerHarness::new();
    harness.write_source("uploads/intro.mp4", b"fake video bytes");
    let lesson_id = harness.create_lesson(Some("uploads/intro.mp4"));

    harness.worker.start().await;

    assert!(
        harness
            .wait_for_status(lesson_id, VideoStatus::Completed)
            .await,
        "worker should pick the lesson up and complete it"
    );

    harness.worker.stop().await;
}

#[tokio::test]
async fn test_worker_recovers_lesson_left_processing() {
    let harness = WorkerHarness::new();
    harness.write_source("uploads/stale.mp4", b"fake video bytes");
    harness.write_source("uploads/fresh.mp4", b"fake video bytes");
    let stale_id = harness.create_lesson(Some("uploads/stale.mp4"));
    let fresh_id = harness.create_lesson(Some("uploads/fresh.mp4"));

    // A previous worker claimed this lesson and died mid-run.
    harness
        .store
        .mark_processing(stale_id)
        .expect("Failed to mark lesson processing");

    harness.worker.start().await;

    assert!(
        harness
            .wait_for_status(stale_id, VideoStatus::Completed)
            .await,
        "startup recovery should re-dispatch the stale lesson"
    );
    assert!(
        harness
            .wait_for_status(fresh_id, VideoStatus::Completed)
            .await,
        "recovery must not starve freshly pending lessons"
    );

    harness.worker.stop().await;
}

#[tokio::test]
async fn test_worker_ignores_lessons_without_upload() {
    let harness = WorkerHarness::new();
    let lesson_id = harness.create_lesson(None);

    harness.worker.start().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        harness.status(lesson_id),
        VideoStatus::Pending,
        "a lesson without a video is not claimable work"
    );

    harness.worker.stop().await;
}

#[tokio::test]
async fn test_stopped_worker_claims_nothing() {
    let harness = WorkerHarness::new();

    harness.worker.start().await;
    harness.worker.stop().await;

    harness.write_source("uploads/intro.mp4", b"fake video bytes");
    let lesson_id = harness.create_lesson(Some("uploads/intro.mp4"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.status(lesson_id), VideoStatus::Pending);
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let harness = WorkerHarness::new();
    assert!(!harness.worker.is_running());

    harness.worker.start().await;
    harness.worker.start().await;
    assert!(harness.worker.is_running());

    harness.worker.stop().await;
    harness.worker.stop().await;
    assert!(!harness.worker.is_running());
}
