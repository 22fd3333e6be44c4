//! Filesystem layout of one lesson's encrypted HLS output.

use std::path::{Path, PathBuf};

/// Playlist file name, written last by the encoder.
pub const PLAYLIST_NAME: &str = "index.m3u8";

/// Segment file name template, expanded by the encoder.
pub const SEGMENT_PATTERN: &str = "segment_%03d.ts";

/// Raw AES-128 key file name.
pub const KEY_FILE_NAME: &str = "enc.key";

/// Key-info descriptor file name (encoder input).
pub const KEY_INFO_FILE_NAME: &str = "enc.keyinfo";

/// Resolved output location for a single lesson.
///
/// The directory is owned entirely by the transcode run: it is recreated
/// fresh at the start of every attempt and removed as a whole on terminal
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsOutput {
    lesson_id: i64,
    dir: PathBuf,
}

impl HlsOutput {
    /// Output location under the HLS root, `{hls_root}/lesson_{id}/`.
    pub fn for_lesson(hls_root: &Path, lesson_id: i64) -> Self {
        Self {
            lesson_id,
            dir: hls_root.join(format!("lesson_{}", lesson_id)),
        }
    }

    pub fn lesson_id(&self) -> i64 {
        self.lesson_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.dir.join(PLAYLIST_NAME)
    }

    pub fn segment_pattern(&self) -> PathBuf {
        self.dir.join(SEGMENT_PATTERN)
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE_NAME)
    }

    pub fn key_info_path(&self) -> PathBuf {
        self.dir.join(KEY_INFO_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_is_keyed_by_lesson_id() {
        let output = HlsOutput::for_lesson(Path::new("/srv/hls"), 42);
        assert_eq!(output.dir(), Path::new("/srv/hls/lesson_42"));
        assert_eq!(output.lesson_id(), 42);
    }

    #[test]
    fn test_artifact_paths_live_inside_the_output_dir() {
        let output = HlsOutput::for_lesson(Path::new("/srv/hls"), 7);
        assert_eq!(output.playlist_path(), Path::new("/srv/hls/lesson_7/index.m3u8"));
        assert_eq!(
            output.segment_pattern(),
            Path::new("/srv/hls/lesson_7/segment_%03d.ts")
        );
        assert_eq!(output.key_path(), Path::new("/srv/hls/lesson_7/enc.key"));
        assert_eq!(output.key_info_path(), Path::new("/srv/hls/lesson_7/enc.keyinfo"));
    }
}
