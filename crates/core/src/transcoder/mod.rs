//! Video transcoding to encrypted HLS.
//!
//! # Features
//!
//! - ffmpeg-backed transcoding to AES-128 encrypted, segmented HLS
//! - Fixed low-bitrate output profile (h264 CRF 28, 480p, AAC 96k)
//! - Per-job argument construction, no shell interpolation
//! - Encode timeout with process kill on expiry
//! - Progress parsing from ffmpeg's machine-readable stderr stream
//!
//! # Example
//!
//! ```ignore
//! use lectern_core::transcoder::{FfmpegTranscoder, HlsJob, Transcoder, TranscoderConfig};
//!
//! let transcoder = FfmpegTranscoder::new(TranscoderConfig::default());
//! transcoder.validate().await?;
//! let output = transcoder.transcode(&job).await?;
//! println!("encoded in {:?}", output.elapsed);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{HlsJob, TranscodeOutput};
