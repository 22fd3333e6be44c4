//! Lesson persistence trait.

use super::types::{Lesson, VideoOutcome, VideoStatus};

#[derive(Debug)]
pub enum LessonStoreError {
    NotFound(i64),
    InvalidTransition {
        lesson_id: i64,
        current: VideoStatus,
    },
    Database(String),
}

impl std::fmt::Display for LessonStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "lesson {} not found", id),
            Self::InvalidTransition { lesson_id, current } => write!(
                f,
                "lesson {} cannot enter processing from status '{}'",
                lesson_id, current
            ),
            Self::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for LessonStoreError {}

/// Fields needed to create a lesson record.
#[derive(Debug, Clone)]
pub struct CreateLessonRequest {
    pub title: String,
    /// Storage-relative path of the uploaded source video, if any.
    pub video_path: Option<String>,
}

/// Storage backend for lesson records.
///
/// Methods are synchronous; callers on async runtimes keep individual
/// operations short (single statements) so blocking stays negligible.
pub trait LessonStore: Send + Sync {
    fn create(&self, request: CreateLessonRequest) -> Result<Lesson, LessonStoreError>;

    fn get(&self, lesson_id: i64) -> Result<Option<Lesson>, LessonStoreError>;

    /// Lessons awaiting transcode: status `pending` with an uploaded video,
    /// oldest first.
    fn list_pending(&self, limit: i64) -> Result<Vec<Lesson>, LessonStoreError>;

    /// Lessons currently marked `processing`, oldest first. Used at worker
    /// startup to pick up lessons a previous run claimed but never finished.
    fn list_processing(&self) -> Result<Vec<Lesson>, LessonStoreError>;

    /// Moves the lesson into `processing` and resets progress. Fails with
    /// `InvalidTransition` when the lesson has already completed.
    fn mark_processing(&self, lesson_id: i64) -> Result<Lesson, LessonStoreError>;

    fn update_progress(&self, lesson_id: i64, percent: u8) -> Result<(), LessonStoreError>;

    /// Applies a terminal outcome. On success the status, key and playlist
    /// path are written together in a single statement so readers never see
    /// a completed lesson without its key material.
    fn record_outcome(
        &self,
        lesson_id: i64,
        outcome: &VideoOutcome,
    ) -> Result<Lesson, LessonStoreError>;
}
