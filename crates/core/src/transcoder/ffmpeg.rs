//! ffmpeg-based HLS transcoder.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex_lite::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{HlsJob, TranscodeOutput};

/// Trailing stderr lines retained for failure diagnostics. ffmpeg reports
/// its fatal errors last, so a bounded tail is enough.
const STDERR_TAIL_LINES: usize = 40;

/// Minimum interval between encode-progress debug logs.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// HLS transcoder backed by the ffmpeg binary.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the encoder argument vector for one job. Arguments are
    /// passed to the process directly; no shell is ever involved.
    fn build_hls_args(&self, job: &HlsJob) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.source.to_string_lossy().to_string(),
        ];

        // Video: h264 pinned to the low-bitrate profile
        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-maxrate".to_string(),
            self.config.max_rate.clone(),
            "-bufsize".to_string(),
            self.config.buf_size.clone(),
            "-vf".to_string(),
            format!("scale=-2:{}", self.config.video_height),
        ]);

        // Audio
        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
            "-ar".to_string(),
            self.config.audio_sample_rate.to_string(),
        ]);

        // HLS muxer: unbounded VOD playlist, per-segment encryption
        args.extend([
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            self.config.segment_secs.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_segment_filename".to_string(),
            job.segment_pattern.to_string_lossy().to_string(),
            "-hls_key_info_file".to_string(),
            job.key_info_path.to_string_lossy().to_string(),
        ]);

        // Diagnosable logs, machine-readable progress on stderr
        args.extend([
            "-loglevel".to_string(),
            "info".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.push(job.playlist_path.to_string_lossy().to_string());
        args
    }

    async fn run_encoder(&self, job: &HlsJob) -> Result<TranscodeOutput, TranscodeError> {
        let start = Instant::now();
        let args = self.build_hls_args(job);

        debug!("ffmpeg args for lesson {}: {:?}", job.lesson_id, args);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let speed_regex = Regex::new(r"speed=(\d+\.?\d*)x").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut encoded_secs = 0.0;
            let mut speed: Option<String> = None;
            let mut last_progress_log = Instant::now();

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(ref re) = time_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(ms) = caps.get(1) {
                            if let Ok(ms) = ms.as_str().parse::<f64>() {
                                encoded_secs = ms / 1_000_000.0;
                            }
                        }
                    }
                }

                if let Some(ref re) = speed_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(s) = caps.get(1) {
                            speed = Some(format!("{}x", s.as_str()));
                        }
                        if last_progress_log.elapsed() >= PROGRESS_LOG_INTERVAL {
                            debug!(
                                "lesson {}: encoded {:.1}s so far ({})",
                                job.lesson_id,
                                encoded_secs,
                                speed.as_deref().unwrap_or("?"),
                            );
                            last_progress_log = Instant::now();
                        }
                    }
                }

                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, VecDeque<String>), std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    let stderr_tail = tail.into_iter().collect::<Vec<_>>().join("\n");
                    return Err(TranscodeError::execution_failed(
                        format!("ffmpeg exited with code {:?}", status.code()),
                        if stderr_tail.is_empty() {
                            None
                        } else {
                            Some(stderr_tail)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(TranscodeError::Io(e)),
            Err(_) => {
                // Kill the encoder on timeout
                let _ = child.kill().await;
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let elapsed = start.elapsed();
        info!(
            "ffmpeg finished lesson {} in {:.1}s",
            job.lesson_id,
            elapsed.as_secs_f64()
        );
        Ok(TranscodeOutput { elapsed })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::execution_failed(
                format!("ffmpeg -version exited with code {:?}", output.status.code()),
                None,
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = stdout.lines().next() {
            debug!("Encoder available: {}", first_line.trim());
        }
        Ok(())
    }

    async fn transcode(&self, job: &HlsJob) -> Result<TranscodeOutput, TranscodeError> {
        self.run_encoder(job).await
    }
}
