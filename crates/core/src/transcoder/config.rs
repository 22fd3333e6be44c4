//! Transcoder configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout_secs() -> u64 {
    1800
}

fn default_crf() -> u32 {
    28
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_max_rate() -> String {
    "1M".to_string()
}

fn default_buf_size() -> String {
    "2M".to_string()
}

fn default_video_height() -> u32 {
    480
}

fn default_audio_bitrate() -> String {
    "96k".to_string()
}

fn default_audio_sample_rate() -> u32 {
    44100
}

fn default_segment_secs() -> u32 {
    10
}

/// Configuration for the ffmpeg HLS transcoder.
///
/// Defaults describe the canonical encode profile: h264 at CRF 28 capped
/// at 1 Mbit/s, 480p, AAC 96k, 10-second encrypted segments in an
/// unbounded VOD playlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for a single encode job in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// h264 constant rate factor (larger means smaller output)
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// x264 preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Peak bitrate cap passed to `-maxrate`
    #[serde(default = "default_max_rate")]
    pub max_rate: String,

    /// Rate-control buffer passed to `-bufsize`
    #[serde(default = "default_buf_size")]
    pub buf_size: String,

    /// Output height; width is derived to keep the aspect ratio even
    #[serde(default = "default_video_height")]
    pub video_height: u32,

    /// AAC audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Audio sample rate in Hz
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,

    /// Target segment duration in seconds
    #[serde(default = "default_segment_secs")]
    pub segment_secs: u32,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
            crf: default_crf(),
            preset: default_preset(),
            max_rate: default_max_rate(),
            buf_size: default_buf_size(),
            video_height: default_video_height(),
            audio_bitrate: default_audio_bitrate(),
            audio_sample_rate: default_audio_sample_rate(),
            segment_secs: default_segment_secs(),
        }
    }
}

impl TranscoderConfig {
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_crf(mut self, crf: u32) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_video_height(mut self, height: u32) -> Self {
        self.video_height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let config = TranscoderConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.timeout_secs, 1800);
        assert_eq!(config.crf, 28);
        assert_eq!(config.preset, "fast");
        assert_eq!(config.max_rate, "1M");
        assert_eq!(config.buf_size, "2M");
        assert_eq!(config.video_height, 480);
        assert_eq!(config.audio_bitrate, "96k");
        assert_eq!(config.audio_sample_rate, 44100);
        assert_eq!(config.segment_secs, 10);
    }

    #[test]
    fn test_builders() {
        let config = TranscoderConfig::default()
            .with_ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
            .with_timeout(600)
            .with_crf(23)
            .with_video_height(720);
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.crf, 23);
        assert_eq!(config.video_height, 720);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TranscoderConfig = toml::from_str(
            r#"
            crf = 26
            preset = "veryfast"
            "#,
        )
        .unwrap();
        assert_eq!(config.crf, 26);
        assert_eq!(config.preset, "veryfast");
        assert_eq!(config.timeout_secs, 1800);
        assert_eq!(config.segment_secs, 10);
    }
}
