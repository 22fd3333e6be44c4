//! Transcoder trait.

use async_trait::async_trait;

use super::error::TranscodeError;
use super::types::{HlsJob, TranscodeOutput};

/// Interface to the video encoder.
///
/// One call encodes one lesson's source into encrypted HLS. The call runs
/// the encoder to completion (or until the configured timeout kills it),
/// so callers treat it as the long, blocking middle of an attempt.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Verifies the encoder is present and executable, without encoding.
    async fn validate(&self) -> Result<(), TranscodeError>;

    /// Runs one encode to completion.
    async fn transcode(&self, job: &HlsJob) -> Result<TranscodeOutput, TranscodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::HlsOutput;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    struct StubTranscoder;

    #[async_trait]
    impl Transcoder for StubTranscoder {
        fn name(&self) -> &str {
            "stub"
        }

        async fn validate(&self) -> Result<(), TranscodeError> {
            Ok(())
        }

        async fn transcode(&self, _job: &HlsJob) -> Result<TranscodeOutput, TranscodeError> {
            Ok(TranscodeOutput {
                elapsed: Duration::from_millis(1),
            })
        }
    }

    #[tokio::test]
    async fn test_trait_is_object_safe() {
        let transcoder: Arc<dyn Transcoder> = Arc::new(StubTranscoder);
        assert_eq!(transcoder.name(), "stub");
        assert!(transcoder.validate().await.is_ok());

        let output = HlsOutput::for_lesson(Path::new("/tmp/hls"), 1);
        let job = HlsJob::from_output(1, "/tmp/in.mp4", &output);
        assert!(transcoder.transcode(&job).await.is_ok());
    }
}
