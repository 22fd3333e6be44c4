//! Pre-flight checks run before anything touches the encoder.
//!
//! None of these failures are retryable: a missing or empty upload and an
//! absent encoder binary do not fix themselves between attempts, so the
//! run short-circuits to a terminal failure without invoking the encoder.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::transcoder::Transcoder;

#[derive(Debug, Error)]
pub enum PrecheckError {
    #[error("source video not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("source video is empty: {path}")]
    EmptySource { path: PathBuf },

    #[error("encoder unavailable: {reason}")]
    Environment { reason: String },
}

impl PrecheckError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Checks that the source file exists and is non-empty; returns its size.
pub async fn check_source(path: &Path) -> Result<u64, PrecheckError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(_) => {
            return Err(PrecheckError::MissingSource {
                path: path.to_path_buf(),
            })
        }
    };

    if !meta.is_file() {
        return Err(PrecheckError::MissingSource {
            path: path.to_path_buf(),
        });
    }

    if meta.len() == 0 {
        return Err(PrecheckError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    debug!("Source {} is {} bytes", path.display(), meta.len());
    Ok(meta.len())
}

/// Checks that the encoder is present and executable.
pub async fn check_encoder<T: Transcoder + ?Sized>(transcoder: &T) -> Result<(), PrecheckError> {
    transcoder
        .validate()
        .await
        .map_err(|e| PrecheckError::Environment {
            reason: e.to_string(),
        })
}
