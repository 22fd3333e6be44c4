//! Pipeline error types.

use thiserror::Error;

use crate::keys::KeyError;
use crate::lesson::LessonStoreError;
use crate::precheck::PrecheckError;
use crate::transcoder::TranscodeError;
use crate::verify::VerifyError;

/// Failure of a single transcode attempt. Wraps the stage errors so the
/// retry decision can ask one place whether trying again makes sense.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Precheck(#[from] PrecheckError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("failed to prepare output directory: {0}")]
    OutputDir(#[source] std::io::Error),
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Precheck(e) => e.is_retryable(),
            Self::Keys(e) => e.is_retryable(),
            Self::Transcode(e) => e.is_retryable(),
            Self::Verify(e) => e.is_retryable(),
            Self::OutputDir(_) => true,
        }
    }

    /// Captured encoder stderr, when the failing stage kept any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Transcode(TranscodeError::ExecutionFailed {
                stderr: Some(stderr),
                ..
            }) => Some(stderr),
            _ => None,
        }
    }
}

/// Failure of a whole pipeline run, before or between attempts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("lesson {0} not found")]
    LessonNotFound(i64),

    #[error("lesson store: {0}")]
    Store(#[from] LessonStoreError),
}
