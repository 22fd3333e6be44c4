//! Output directory lifecycle.

use std::io;

use tokio::fs;
use tracing::{info, warn};

use crate::layout::HlsOutput;

/// Resets a lesson's output directory to empty, creating it if needed.
/// Each attempt starts here so no stale segments or key files survive
/// into the next run.
pub async fn prepare_output_dir(output: &HlsOutput) -> io::Result<()> {
    match fs::remove_dir_all(output.dir()).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(output.dir()).await
}

/// Removes a lesson's output directory and everything in it. Idempotent:
/// a missing directory is already the desired state. Failures are logged
/// and swallowed so cleanup never masks the error that caused it.
pub async fn cleanup_output(output: &HlsOutput) {
    match fs::remove_dir_all(output.dir()).await {
        Ok(()) => {
            info!(
                "Removed output directory for lesson {}: {}",
                output.lesson_id(),
                output.dir().display()
            );
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(
                "Failed to remove output directory {}: {}",
                output.dir().display(),
                e
            );
        }
    }
}
