//! Core library for the lectern video pipeline.
//!
//! Converts uploaded lecture videos into AES-128 encrypted, segmented HLS
//! renditions, tracking each lesson's lifecycle
//! (`pending -> processing -> completed/failed`) on its persisted record.

pub mod config;
pub mod keys;
pub mod layout;
pub mod lesson;
pub mod pipeline;
pub mod precheck;
pub mod testing;
pub mod transcoder;
pub mod verify;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
};
pub use layout::HlsOutput;
pub use lesson::{
    CreateLessonRequest, Lesson, LessonStore, LessonStoreError, SqliteLessonStore, VideoOutcome,
    VideoStatus,
};
pub use pipeline::{
    PipelineConfig, PipelineError, PipelineOutcome, PipelineWorker, VideoPipeline, WorkerConfig,
};
pub use transcoder::{
    FfmpegTranscoder, HlsJob, TranscodeError, TranscodeOutput, Transcoder, TranscoderConfig,
};
