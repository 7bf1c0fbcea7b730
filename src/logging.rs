//! File logging
//!
//! Everything goes to `logs/dockyard.log` under the data directory; stdout is
//! reserved for command output. The level comes from `RUST_LOG`, default
//! `info`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::paths::DockyardPaths;
use crate::error::DockyardResult;

pub const LOG_FILE_NAME: &str = "dockyard.log";

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process so buffered
/// lines are flushed on exit. Installing twice is a no-op.
pub fn init(paths: &DockyardPaths) -> DockyardResult<WorkerGuard> {
    let log_dir = paths.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}
