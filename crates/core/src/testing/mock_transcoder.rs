//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transcoder::{HlsJob, TranscodeError, TranscodeOutput, Transcoder};

/// A recorded transcode call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    /// The job that was submitted.
    pub job: HlsJob,
    /// Whether the call succeeded.
    pub success: bool,
    /// Key info file content as it stood when the call ran, letting tests
    /// observe which key material each attempt saw.
    pub key_info: Option<String>,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track transcode calls for assertions
/// - Simulate one-shot or repeated failures
/// - Fabricate playlist and segment files that pass output verification
///
/// # Example
///
/// ```rust,ignore
/// use lectern_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.set_fail_times(2).await;
///
/// // Run the pipeline; first two attempts fail, the third succeeds
/// let recorded = transcoder.recorded().await;
/// assert_eq!(recorded.len(), 3);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded transcode calls.
    calls: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// Number of validate calls.
    validate_calls: Arc<RwLock<u32>>,
    /// Remaining transcode calls to fail; `u32::MAX` fails forever.
    fail_times: Arc<RwLock<u32>>,
    /// If set, the next transcode fails with this error.
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    /// If set, the next validate fails with this error.
    validate_error: Arc<RwLock<Option<TranscodeError>>>,
    /// Simulated encode duration.
    transcode_duration: Arc<RwLock<Duration>>,
    /// Segments fabricated per successful call.
    segment_count: Arc<RwLock<usize>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            validate_calls: Arc::new(RwLock::new(0)),
            fail_times: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
            validate_error: Arc::new(RwLock::new(None)),
            transcode_duration: Arc::new(RwLock::new(Duration::ZERO)),
            segment_count: Arc::new(RwLock::new(3)),
        }
    }

    /// Get all recorded transcode calls.
    pub async fn recorded(&self) -> Vec<RecordedTranscode> {
        self.calls.read().await.clone()
    }

    /// Clear recorded transcode calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Get the number of transcode calls made, failed ones included.
    pub async fn transcode_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Get the number of validate calls made.
    pub async fn validate_count(&self) -> u32 {
        *self.validate_calls.read().await
    }

    /// Fail the next `times` transcode calls; `u32::MAX` fails forever.
    pub async fn set_fail_times(&self, times: u32) {
        *self.fail_times.write().await = times;
    }

    /// Configure the next transcode to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next validate to fail with the given error.
    pub async fn set_validate_error(&self, error: TranscodeError) {
        *self.validate_error.write().await = Some(error);
    }

    /// Set the simulated encode duration.
    pub async fn set_transcode_duration(&self, duration: Duration) {
        *self.transcode_duration.write().await = duration;
    }

    /// Set how many segments a successful call fabricates.
    pub async fn set_segment_count(&self, count: usize) {
        *self.segment_count.write().await = count;
    }

    async fn record(&self, job: &HlsJob, success: bool) {
        let key_info = tokio::fs::read_to_string(&job.key_info_path).await.ok();
        self.calls.write().await.push(RecordedTranscode {
            job: job.clone(),
            success,
            key_info,
        });
    }

    /// Fabricates a playlist and segment files shaped like real encoder
    /// output, including the key line derived from the job's key info file.
    async fn write_fake_output(&self, job: &HlsJob) -> Result<(), TranscodeError> {
        let key_info = tokio::fs::read_to_string(&job.key_info_path).await?;
        let mut lines = key_info.lines();
        let uri = lines.next().unwrap_or_default();
        let _key_path = lines.next();
        let iv = lines.next().unwrap_or_default();

        let segment_dir = job
            .playlist_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();

        let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
        manifest.push_str("#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n");
        manifest.push_str(&format!(
            "#EXT-X-KEY:METHOD=AES-128,URI=\"{}\",IV=0x{}\n",
            uri, iv
        ));

        let segments = *self.segment_count.read().await;
        for i in 0..segments {
            let name = format!("segment_{:03}.ts", i);
            tokio::fs::write(segment_dir.join(&name), b"fake segment data").await?;
            manifest.push_str(&format!("#EXTINF:10.0,\n{}\n", name));
        }
        manifest.push_str("#EXT-X-ENDLIST\n");

        tokio::fs::write(&job.playlist_path, manifest).await?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        *self.validate_calls.write().await += 1;
        if let Some(err) = self.validate_error.write().await.take() {
            return Err(err);
        }
        Ok(())
    }

    async fn transcode(&self, job: &HlsJob) -> Result<TranscodeOutput, TranscodeError> {
        let duration = *self.transcode_duration.read().await;
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            self.record(job, false).await;
            return Err(err);
        }

        let should_fail = {
            let mut remaining = self.fail_times.write().await;
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                true
            } else {
                false
            }
        };
        if should_fail {
            self.record(job, false).await;
            return Err(TranscodeError::execution_failed(
                "mock encoder exited with code 1",
                Some("simulated encoder failure".to_string()),
            ));
        }

        self.write_fake_output(job).await?;
        self.record(job, true).await;
        Ok(TranscodeOutput { elapsed: duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{key_uri, write_key_files, KeyMaterial};
    use crate::layout::HlsOutput;
    use crate::verify::verify_output;
    use tempfile::tempdir;

    async fn prepared_job(root: &std::path::Path, lesson_id: i64) -> (HlsJob, HlsOutput) {
        let output = HlsOutput::for_lesson(root, lesson_id);
        tokio::fs::create_dir_all(output.dir()).await.unwrap();

        let material = KeyMaterial::generate();
        let uri = key_uri("/lessons/{lesson_id}/key", lesson_id);
        write_key_files(&material, &output, &uri).await.unwrap();

        let job = HlsJob::from_output(lesson_id, "/uploads/intro.mp4", &output);
        (job, output)
    }

    #[tokio::test]
    async fn test_fabricated_output_passes_verification() {
        let tmp = tempdir().unwrap();
        let (job, output) = prepared_job(tmp.path(), 1).await;

        let transcoder = MockTranscoder::new();
        transcoder.transcode(&job).await.unwrap();

        let segments = verify_output(&output).await.unwrap();
        assert_eq!(segments, 3);

        let manifest = tokio::fs::read_to_string(output.playlist_path())
            .await
            .unwrap();
        assert!(manifest.contains("#EXT-X-KEY:METHOD=AES-128,URI=\"/lessons/1/key\""));
        assert!(manifest.contains("IV=0x"));
        assert!(manifest.ends_with("#EXT-X-ENDLIST\n"));
    }

    #[tokio::test]
    async fn test_records_calls_with_key_info() {
        let tmp = tempdir().unwrap();
        let (job, _output) = prepared_job(tmp.path(), 1).await;

        let transcoder = MockTranscoder::new();
        transcoder.transcode(&job).await.unwrap();

        let recorded = transcoder.recorded().await;
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].success);
        let key_info = recorded[0].key_info.as_ref().unwrap();
        assert!(key_info.starts_with("/lessons/1/key\n"));
    }

    #[tokio::test]
    async fn test_fail_times_counts_down() {
        let tmp = tempdir().unwrap();
        let (job, _output) = prepared_job(tmp.path(), 1).await;

        let transcoder = MockTranscoder::new();
        transcoder.set_fail_times(2).await;

        assert!(transcoder.transcode(&job).await.is_err());
        assert!(transcoder.transcode(&job).await.is_err());
        assert!(transcoder.transcode(&job).await.is_ok());

        let recorded = transcoder.recorded().await;
        assert_eq!(recorded.len(), 3);
        assert!(!recorded[0].success);
        assert!(!recorded[1].success);
        assert!(recorded[2].success);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed_once() {
        let tmp = tempdir().unwrap();
        let (job, _output) = prepared_job(tmp.path(), 1).await;

        let transcoder = MockTranscoder::new();
        transcoder
            .set_next_error(TranscodeError::Timeout { timeout_secs: 5 })
            .await;

        let err = transcoder.transcode(&job).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Timeout { .. }));
        assert!(transcoder.transcode(&job).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_error_injection() {
        let transcoder = MockTranscoder::new();
        transcoder
            .set_validate_error(TranscodeError::FfmpegNotFound {
                path: "/usr/bin/ffmpeg".into(),
            })
            .await;

        assert!(transcoder.validate().await.is_err());
        assert!(transcoder.validate().await.is_ok());
        assert_eq!(transcoder.validate_count().await, 2);
    }
}
