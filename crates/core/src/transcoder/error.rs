//! Transcoder error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while invoking the encoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The ffmpeg binary was not found at the configured path
    #[error("ffmpeg not found at {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The encoder ran but exited unsuccessfully
    #[error("transcode failed: {reason}")]
    ExecutionFailed {
        reason: String,
        /// Trailing stderr output, when any was captured
        stderr: Option<String>,
    },

    /// The encoder exceeded its timeout and was killed
    #[error("transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates an execution failure with optional captured stderr.
    pub fn execution_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether another attempt could plausibly succeed. A missing binary
    /// is an environment problem and will not fix itself mid-run.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::FfmpegNotFound { .. })
    }
}
