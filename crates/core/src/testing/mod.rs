//! Testing utilities and mock implementations for pipeline tests.
//!
//! This module provides a mock transcoder so the full pipeline can be
//! exercised without a real ffmpeg binary or real video files.
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_core::testing::MockTranscoder;
//!
//! let transcoder = MockTranscoder::new();
//! transcoder.set_fail_times(2).await;
//!
//! // Use in a VideoPipeline...
//! ```

mod mock_transcoder;

pub use mock_transcoder::{MockTranscoder, RecordedTranscode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::lesson::CreateLessonRequest;

    /// Create a lesson request with an uploaded source video.
    pub fn lesson_with_video(title: &str, video_path: &str) -> CreateLessonRequest {
        CreateLessonRequest {
            title: title.to_string(),
            video_path: Some(video_path.to_string()),
        }
    }

    /// Create a lesson request without any uploaded video.
    pub fn lesson_without_video(title: &str) -> CreateLessonRequest {
        CreateLessonRequest {
            title: title.to_string(),
            video_path: None,
        }
    }
}
