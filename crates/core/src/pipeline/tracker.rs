//! Lesson state transitions during a pipeline run.

use std::sync::Arc;

use tracing::{info, warn};

use crate::lesson::{Lesson, LessonStore, LessonStoreError, VideoOutcome};

/// Progress checkpoints recorded as the pipeline moves through its stages.
pub(crate) mod checkpoint {
    pub const ENVIRONMENT: u8 = 10;
    pub const DIRECTORIES: u8 = 20;
    pub const KEYS: u8 = 30;
    pub const ENCODE_STARTED: u8 = 40;
    pub const ENCODE_FINISHED: u8 = 80;
    pub const VERIFIED: u8 = 95;
}

/// Applies pipeline state changes to the lesson store and logs them.
pub struct StateTracker {
    store: Arc<dyn LessonStore>,
}

impl StateTracker {
    pub fn new(store: Arc<dyn LessonStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, lesson_id: i64) -> Result<Option<Lesson>, LessonStoreError> {
        self.store.get(lesson_id)
    }

    pub fn mark_processing(&self, lesson_id: i64) -> Result<Lesson, LessonStoreError> {
        self.store.mark_processing(lesson_id)
    }

    /// Records a progress checkpoint. Progress is advisory, so a store
    /// error here is logged and does not interrupt the run.
    pub fn record_progress(&self, lesson_id: i64, percent: u8) {
        if let Err(e) = self.store.update_progress(lesson_id, percent) {
            warn!("Failed to record progress for lesson {}: {}", lesson_id, e);
        }
    }

    pub fn record_outcome(
        &self,
        lesson_id: i64,
        outcome: &VideoOutcome,
    ) -> Result<Lesson, LessonStoreError> {
        match outcome {
            VideoOutcome::Success { playlist_path, .. } => {
                info!(
                    "Lesson {} completed, playlist at {}",
                    lesson_id, playlist_path
                );
            }
            VideoOutcome::Failure { reason } => {
                info!("Lesson {} attempt failed: {}", lesson_id, reason);
            }
        }
        self.store.record_outcome(lesson_id, outcome)
    }
}
