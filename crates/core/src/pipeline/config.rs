//! Pipeline and worker configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::layout::{HlsOutput, PLAYLIST_NAME};

fn default_storage_root() -> PathBuf {
    PathBuf::from("storage/app")
}

fn default_hls_dir() -> String {
    "private_videos/hls".to_string()
}

fn default_attempts_max() -> u32 {
    5
}

fn default_retry_backoff_secs() -> u64 {
    30
}

fn default_deadline_secs() -> u64 {
    // 4 hours, bounding the whole retry cycle for one lesson
    14400
}

fn default_key_url_template() -> String {
    "/lessons/{lesson_id}/key".to_string()
}

/// Settings for the per-lesson transcode pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Application storage root; source paths and HLS output live under it.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// Directory under `storage_root` holding per-lesson HLS output.
    #[serde(default = "default_hls_dir")]
    pub hls_dir: String,

    /// Maximum processing attempts per lesson, counting the first.
    #[serde(default = "default_attempts_max")]
    pub attempts_max: u32,

    /// Fixed pause between attempts, in seconds.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Absolute deadline for one lesson's retry cycle, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Playback key URL written into the playlist; `{lesson_id}` expands.
    #[serde(default = "default_key_url_template")]
    pub key_url_template: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            hls_dir: default_hls_dir(),
            attempts_max: default_attempts_max(),
            retry_backoff_secs: default_retry_backoff_secs(),
            deadline_secs: default_deadline_secs(),
            key_url_template: default_key_url_template(),
        }
    }
}

impl PipelineConfig {
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_attempts_max(mut self, attempts: u32) -> Self {
        self.attempts_max = attempts;
        self
    }

    pub fn with_backoff_secs(mut self, secs: u64) -> Self {
        self.retry_backoff_secs = secs;
        self
    }

    pub fn with_deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = secs;
        self
    }

    /// Absolute root of all HLS output directories.
    pub fn hls_root(&self) -> PathBuf {
        self.storage_root.join(&self.hls_dir)
    }

    /// Output location for one lesson.
    pub fn output_for(&self, lesson_id: i64) -> HlsOutput {
        HlsOutput::for_lesson(&self.hls_root(), lesson_id)
    }

    /// Absolute path of a storage-relative source video.
    pub fn resolve_source(&self, video_path: &str) -> PathBuf {
        self.storage_root.join(video_path)
    }

    /// Storage-relative playlist path persisted on the lesson record.
    pub fn relative_playlist_path(&self, lesson_id: i64) -> String {
        format!("{}/lesson_{}/{}", self.hls_dir, lesson_id, PLAYLIST_NAME)
    }
}

fn default_worker_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_concurrent() -> usize {
    2
}

/// Settings for the background worker that feeds the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_enabled")]
    pub enabled: bool,

    /// Pause between polls for pending lessons, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum lessons transcoding at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_worker_enabled(),
            poll_interval_ms: default_poll_interval_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.attempts_max, 5);
        assert_eq!(config.retry_backoff_secs, 30);
        assert_eq!(config.deadline_secs, 14400);
        assert_eq!(config.hls_root(), PathBuf::from("storage/app/private_videos/hls"));
    }

    #[test]
    fn test_output_paths_derive_from_storage_root() {
        let config = PipelineConfig::default().with_storage_root("/srv/app");
        let output = config.output_for(7);
        assert_eq!(
            output.dir(),
            Path::new("/srv/app/private_videos/hls/lesson_7")
        );
        assert_eq!(
            config.resolve_source("uploads/intro.mp4"),
            PathBuf::from("/srv/app/uploads/intro.mp4")
        );
    }

    #[test]
    fn test_relative_playlist_path_matches_layout() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.relative_playlist_path(42),
            "private_videos/hls/lesson_42/index.m3u8"
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PipelineConfig = toml::from_str("attempts_max = 2").unwrap();
        assert_eq!(config.attempts_max, 2);
        assert_eq!(config.retry_backoff_secs, 30);
        assert_eq!(config.key_url_template, "/lessons/{lesson_id}/key");
    }

    #[test]
    fn test_default_worker_config() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.max_concurrent, 2);
    }
}
