//! Transcoder job types.

use std::path::PathBuf;
use std::time::Duration;

use crate::layout::HlsOutput;

/// One encode: a single source file in, an encrypted HLS playlist plus
/// segments out. All paths are absolute; the key-info file must already
/// exist when the encoder starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsJob {
    pub lesson_id: i64,
    pub source: PathBuf,
    pub playlist_path: PathBuf,
    pub segment_pattern: PathBuf,
    pub key_info_path: PathBuf,
}

impl HlsJob {
    /// Builds the job for a lesson's resolved output location.
    pub fn from_output(lesson_id: i64, source: impl Into<PathBuf>, output: &HlsOutput) -> Self {
        Self {
            lesson_id,
            source: source.into(),
            playlist_path: output.playlist_path(),
            segment_pattern: output.segment_pattern(),
            key_info_path: output.key_info_path(),
        }
    }
}

/// Result of a completed encode.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    /// Wall-clock time the encoder ran for
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_job_paths_follow_the_output_layout() {
        let output = HlsOutput::for_lesson(Path::new("/srv/hls"), 9);
        let job = HlsJob::from_output(9, "/srv/uploads/video.mp4", &output);

        assert_eq!(job.lesson_id, 9);
        assert_eq!(job.source, Path::new("/srv/uploads/video.mp4"));
        assert_eq!(job.playlist_path, Path::new("/srv/hls/lesson_9/index.m3u8"));
        assert_eq!(
            job.segment_pattern,
            Path::new("/srv/hls/lesson_9/segment_%03d.ts")
        );
        assert_eq!(job.key_info_path, Path::new("/srv/hls/lesson_9/enc.keyinfo"));
    }
}
