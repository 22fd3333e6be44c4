//! The per-lesson transcode pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::keys::{key_uri, write_key_files, KeyMaterial, KEY_LEN};
use crate::layout::HlsOutput;
use crate::lesson::{LessonStore, VideoOutcome, VideoStatus};
use crate::precheck::{check_encoder, check_source};
use crate::transcoder::{HlsJob, Transcoder};
use crate::verify::verify_output;

use super::cleanup::{cleanup_output, prepare_output_dir};
use super::config::PipelineConfig;
use super::error::{AttemptError, PipelineError};
use super::lock::LessonLocks;
use super::tracker::{checkpoint, StateTracker};

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The lesson transcoded and its record now carries key and playlist.
    Completed {
        lesson_id: i64,
        attempts: u32,
        segments: usize,
    },
    /// All attempts failed, the deadline passed, or a terminal error hit.
    Failed {
        lesson_id: i64,
        attempts: u32,
        reason: String,
    },
    /// The lesson had already completed; nothing was done.
    Skipped { lesson_id: i64 },
}

struct AttemptSuccess {
    key: [u8; KEY_LEN],
    segments: usize,
}

/// Runs uploaded lesson videos through encrypted HLS transcoding,
/// tracking lifecycle state on the lesson record throughout.
pub struct VideoPipeline<T: Transcoder> {
    config: PipelineConfig,
    transcoder: Arc<T>,
    tracker: StateTracker,
    locks: LessonLocks,
}

impl<T: Transcoder> VideoPipeline<T> {
    pub fn new(config: PipelineConfig, transcoder: Arc<T>, store: Arc<dyn LessonStore>) -> Self {
        Self {
            config,
            transcoder,
            tracker: StateTracker::new(store),
            locks: LessonLocks::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes one lesson end to end: validate, transcode, verify,
    /// persist, retrying on transient failures until attempts or the
    /// deadline run out. Holds the lesson's lock for the whole run.
    pub async fn process(&self, lesson_id: i64) -> Result<PipelineOutcome, PipelineError> {
        let _guard = self.locks.acquire(lesson_id).await;

        let lesson = self
            .tracker
            .get(lesson_id)?
            .ok_or(PipelineError::LessonNotFound(lesson_id))?;

        if lesson.video_status == VideoStatus::Completed {
            info!("Lesson {} already completed, skipping", lesson_id);
            return Ok(PipelineOutcome::Skipped { lesson_id });
        }

        let output = self.config.output_for(lesson_id);

        let Some(video_path) = lesson.video_path else {
            self.tracker.mark_processing(lesson_id)?;
            self.fail_terminal(lesson_id, &output, 1, "no uploaded video on record")
                .await?;
            return Ok(PipelineOutcome::Failed {
                lesson_id,
                attempts: 1,
                reason: "no uploaded video on record".to_string(),
            });
        };

        let source = self.config.resolve_source(&video_path);
        let started = Instant::now();
        let deadline = Duration::from_secs(self.config.deadline_secs);
        let backoff = Duration::from_secs(self.config.retry_backoff_secs);
        let attempts_max = self.config.attempts_max.max(1);

        let mut attempt: u32 = 1;
        loop {
            self.tracker.mark_processing(lesson_id)?;
            info!(
                "Processing lesson {} (attempt {}/{})",
                lesson_id, attempt, attempts_max
            );

            match self.run_attempt(lesson_id, &source, &output).await {
                Ok(success) => {
                    self.tracker.record_outcome(
                        lesson_id,
                        &VideoOutcome::Success {
                            encryption_key: success.key.to_vec(),
                            playlist_path: self.config.relative_playlist_path(lesson_id),
                        },
                    )?;
                    return Ok(PipelineOutcome::Completed {
                        lesson_id,
                        attempts: attempt,
                        segments: success.segments,
                    });
                }
                Err(e) => {
                    let reason = e.to_string();
                    error!(
                        "Lesson {} attempt {}/{} failed: {}",
                        lesson_id, attempt, attempts_max, reason
                    );
                    if let Some(stderr) = e.diagnostics() {
                        error!("Encoder stderr for lesson {}:\n{}", lesson_id, stderr);
                    }

                    let retry = e.is_retryable()
                        && attempt < attempts_max
                        && started.elapsed() < deadline;

                    if !retry {
                        self.fail_terminal(lesson_id, &output, attempt, &reason)
                            .await?;
                        return Ok(PipelineOutcome::Failed {
                            lesson_id,
                            attempts: attempt,
                            reason,
                        });
                    }

                    self.tracker
                        .record_outcome(lesson_id, &VideoOutcome::Failure { reason })?;
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// One transcode attempt: precheck, fresh directory and keys, encode,
    /// verify. Every attempt regenerates its key material so a half-written
    /// key from a previous crash can never leak into a served playlist.
    async fn run_attempt(
        &self,
        lesson_id: i64,
        source: &Path,
        output: &HlsOutput,
    ) -> Result<AttemptSuccess, AttemptError> {
        let source_size = check_source(source).await?;
        check_encoder(self.transcoder.as_ref()).await?;
        self.tracker.record_progress(lesson_id, checkpoint::ENVIRONMENT);

        prepare_output_dir(output)
            .await
            .map_err(AttemptError::OutputDir)?;
        self.tracker.record_progress(lesson_id, checkpoint::DIRECTORIES);

        let material = KeyMaterial::generate();
        let uri = key_uri(&self.config.key_url_template, lesson_id);
        write_key_files(&material, output, &uri).await?;
        self.tracker.record_progress(lesson_id, checkpoint::KEYS);

        let job = HlsJob::from_output(lesson_id, source, output);
        info!(
            "Invoking {} for lesson {} ({} byte source)",
            self.transcoder.name(),
            lesson_id,
            source_size
        );
        self.tracker
            .record_progress(lesson_id, checkpoint::ENCODE_STARTED);

        let result = self.transcoder.transcode(&job).await?;
        self.tracker
            .record_progress(lesson_id, checkpoint::ENCODE_FINISHED);
        info!(
            "Encode for lesson {} took {:.1}s",
            lesson_id,
            result.elapsed.as_secs_f64()
        );

        let segments = verify_output(output).await?;
        self.tracker.record_progress(lesson_id, checkpoint::VERIFIED);

        Ok(AttemptSuccess {
            key: *material.key_bytes(),
            segments,
        })
    }

    /// Marks the lesson failed for good and removes partial output.
    async fn fail_terminal(
        &self,
        lesson_id: i64,
        output: &HlsOutput,
        attempt: u32,
        reason: &str,
    ) -> Result<(), PipelineError> {
        warn!(
            "Lesson {} failed terminally after {} attempt(s): {}",
            lesson_id, attempt, reason
        );
        self.tracker.record_outcome(
            lesson_id,
            &VideoOutcome::Failure {
                reason: reason.to_string(),
            },
        )?;
        cleanup_output(output).await;
        Ok(())
    }
}
