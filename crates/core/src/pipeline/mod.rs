//! Lesson video transcode pipeline.
//!
//! One uploaded source video goes in; an AES-128 encrypted, segmented HLS
//! rendition comes out, with lifecycle state tracked on the lesson record.
//! Transient failures retry on a fixed backoff until attempts are
//! exhausted or the absolute deadline passes; terminal failures clean up
//! after themselves.

mod cleanup;
mod config;
mod error;
mod lock;
mod runner;
mod tracker;
mod worker;

pub use cleanup::{cleanup_output, prepare_output_dir};
pub use config::{PipelineConfig, WorkerConfig};
pub use error::{AttemptError, PipelineError};
pub use lock::LessonLocks;
pub use runner::{PipelineOutcome, VideoPipeline};
pub use tracker::StateTracker;
pub use worker::PipelineWorker;
