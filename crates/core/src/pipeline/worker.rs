//! Background worker feeding pending lessons into the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};
use tracing::{error, info, warn};

use crate::lesson::LessonStore;
use crate::pipeline::{PipelineError, VideoPipeline};
use crate::transcoder::Transcoder;

use super::config::WorkerConfig;

/// Polls the store for pending lessons and runs them through the pipeline,
/// bounded by a concurrency limit. Start and stop are idempotent.
pub struct PipelineWorker<T: Transcoder + 'static> {
    config: WorkerConfig,
    pipeline: Arc<VideoPipeline<T>>,
    store: Arc<dyn LessonStore>,
    permits: Arc<Semaphore>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<T: Transcoder + 'static> PipelineWorker<T> {
    pub fn new(
        config: WorkerConfig,
        pipeline: Arc<VideoPipeline<T>>,
        store: Arc<dyn LessonStore>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            config,
            pipeline,
            store,
            permits,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Pipeline worker already running");
            return;
        }

        // Re-dispatch lessons a previous run left in processing; the poll
        // loop only claims pending rows and would never revisit them.
        self.recover_processing_lessons();

        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        tokio::spawn(async move {
            info!("Pipeline worker loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Err(e) = Self::dispatch_one(&pipeline, &store, &permits) {
                            warn!("Worker poll failed: {}", e);
                        }
                    }
                }
            }
            info!("Pipeline worker loop stopped");
        });
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
        info!("Pipeline worker stopping");
    }

    /// Re-dispatches lessons left in `processing` by a previous run.
    /// Each run regenerates its own key material and output directory,
    /// so a half-finished attempt is simply started over.
    fn recover_processing_lessons(&self) {
        match self.store.list_processing() {
            Ok(lessons) => {
                let count = lessons.len();
                for lesson in lessons {
                    info!("Recovered in-flight lesson {} ({})", lesson.id, lesson.title);
                    let pipeline = Arc::clone(&self.pipeline);
                    let permits = Arc::clone(&self.permits);
                    tokio::spawn(async move {
                        // No later poll will come back for this lesson,
                        // so wait for a slot instead of skipping.
                        let Ok(_permit) = permits.acquire_owned().await else {
                            return;
                        };
                        match pipeline.process(lesson.id).await {
                            Ok(outcome) => {
                                info!("Lesson {} finished: {:?}", lesson.id, outcome)
                            }
                            Err(e) => warn!("Lesson {} aborted: {}", lesson.id, e),
                        }
                    });
                }
                if count > 0 {
                    info!("Recovered {} in-flight lessons", count);
                }
            }
            Err(e) => {
                error!("Failed to recover in-flight lessons: {}", e);
            }
        }
    }

    /// Claims at most one pending lesson and spawns its pipeline run.
    /// The lesson is marked processing before the task spawns, so the
    /// next poll cannot pick it up again.
    fn dispatch_one(
        pipeline: &Arc<VideoPipeline<T>>,
        store: &Arc<dyn LessonStore>,
        permits: &Arc<Semaphore>,
    ) -> Result<(), PipelineError> {
        // Pool full: leave pending lessons for a later poll
        let Ok(permit) = Arc::clone(permits).try_acquire_owned() else {
            return Ok(());
        };

        let pending = store.list_pending(1)?;
        let Some(lesson) = pending.into_iter().next() else {
            return Ok(());
        };

        store.mark_processing(lesson.id)?;
        info!("Worker claimed lesson {} ({})", lesson.id, lesson.title);

        let pipeline = Arc::clone(pipeline);
        tokio::spawn(async move {
            let _permit = permit;
            match pipeline.process(lesson.id).await {
                Ok(outcome) => info!("Lesson {} finished: {:?}", lesson.id, outcome),
                Err(e) => warn!("Lesson {} aborted: {}", lesson.id, e),
            }
        });

        Ok(())
    }
}
