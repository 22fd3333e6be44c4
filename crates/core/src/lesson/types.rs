//! Lesson record and video lifecycle types.

use chrono::{DateTime, Utc};

/// Processing state of a lesson's uploaded video.
///
/// Records move `Pending -> Processing -> {Completed, Failed}`. A failed
/// lesson may re-enter `Processing` on retry; a completed one never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether the pipeline is finished with this lesson for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the lesson may (re-)enter `Processing`. Only completed
    /// lessons are locked out; failed ones stay eligible for retry.
    pub fn can_process(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lecture lesson with its uploaded source video and transcode state.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    /// Storage-relative path of the uploaded source, if one exists.
    pub video_path: Option<String>,
    pub video_status: VideoStatus,
    /// Coarse progress indicator, 0..=100.
    pub video_progress: u8,
    /// Raw AES-128 key bytes, present only once transcoding completed.
    pub encryption_key: Option<Vec<u8>>,
    /// Storage-relative path of the HLS playlist, present only once completed.
    pub hls_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal result of a transcode run, applied to the lesson record.
#[derive(Debug, Clone)]
pub enum VideoOutcome {
    Success {
        encryption_key: Vec<u8>,
        playlist_path: String,
    },
    Failure {
        reason: String,
    },
}
