//! Post-encode verification of the HLS output.
//!
//! The encoder writes the playlist as its final step, so a present,
//! non-empty playlist with at least one segment entry plus a well-sized
//! key file is the signal that the attempt actually produced playable
//! output. All verification failures are retryable: the next attempt
//! starts from a clean directory.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::keys::KEY_LEN;
use crate::layout::HlsOutput;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("playlist not found: {path}")]
    MissingPlaylist { path: PathBuf },

    #[error("playlist is empty: {path}")]
    EmptyPlaylist { path: PathBuf },

    #[error("playlist references no segments: {path}")]
    NoSegments { path: PathBuf },

    #[error("encryption key at {path} is {actual} bytes, expected 16")]
    KeyFileSize { path: PathBuf, actual: u64 },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl VerifyError {
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Verifies the encoded output and returns the number of segment entries
/// in the playlist.
pub async fn verify_output(output: &HlsOutput) -> Result<usize, VerifyError> {
    let playlist = output.playlist_path();
    let content = match tokio::fs::read_to_string(&playlist).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(VerifyError::MissingPlaylist { path: playlist })
        }
        Err(source) => {
            return Err(VerifyError::Read {
                path: playlist,
                source,
            })
        }
    };

    if content.is_empty() {
        return Err(VerifyError::EmptyPlaylist { path: playlist });
    }

    let segments = content
        .lines()
        .filter(|line| line.trim_end().ends_with(".ts"))
        .count();
    if segments == 0 {
        return Err(VerifyError::NoSegments { path: playlist });
    }

    let key_path = output.key_path();
    let key_len = match tokio::fs::metadata(&key_path).await {
        Ok(meta) => meta.len(),
        Err(_) => 0,
    };
    if key_len != KEY_LEN as u64 {
        return Err(VerifyError::KeyFileSize {
            path: key_path,
            actual: key_len,
        });
    }

    info!(
        "Verified HLS output for lesson {}: {} segments",
        output.lesson_id(),
        segments
    );
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output(tmp: &TempDir) -> HlsOutput {
        let out = HlsOutput::for_lesson(tmp.path(), 1);
        std::fs::create_dir_all(out.dir()).unwrap();
        out
    }

    fn write_manifest(out: &HlsOutput, segments: usize) {
        let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
        for i in 0..segments {
            manifest.push_str(&format!("#EXTINF:10.0,\nsegment_{:03}.ts\n", i));
        }
        manifest.push_str("#EXT-X-ENDLIST\n");
        std::fs::write(out.playlist_path(), manifest).unwrap();
    }

    #[tokio::test]
    async fn test_missing_playlist() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);

        let err = verify_output(&out).await.unwrap_err();
        assert!(matches!(err, VerifyError::MissingPlaylist { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);
        std::fs::write(out.playlist_path(), "").unwrap();

        let err = verify_output(&out).await.unwrap_err();
        assert!(matches!(err, VerifyError::EmptyPlaylist { .. }));
    }

    #[tokio::test]
    async fn test_playlist_without_segments() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);
        std::fs::write(out.playlist_path(), "#EXTM3U\n#EXT-X-ENDLIST\n").unwrap();

        let err = verify_output(&out).await.unwrap_err();
        assert!(matches!(err, VerifyError::NoSegments { .. }));
    }

    #[tokio::test]
    async fn test_missing_key_reports_zero_bytes() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);
        write_manifest(&out, 2);

        let err = verify_output(&out).await.unwrap_err();
        assert!(matches!(err, VerifyError::KeyFileSize { actual: 0, .. }));
    }

    #[tokio::test]
    async fn test_wrong_key_size() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);
        write_manifest(&out, 2);
        std::fs::write(out.key_path(), b"short").unwrap();

        let err = verify_output(&out).await.unwrap_err();
        assert!(matches!(err, VerifyError::KeyFileSize { actual: 5, .. }));
    }

    #[tokio::test]
    async fn test_valid_output_returns_segment_count() {
        let tmp = TempDir::new().unwrap();
        let out = output(&tmp);
        write_manifest(&out, 4);
        std::fs::write(out.key_path(), [0u8; 16]).unwrap();

        assert_eq!(verify_output(&out).await.unwrap(), 4);
    }
}
