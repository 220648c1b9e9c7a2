use color_eyre::{eyre::eyre, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{self, LogConfig};

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "STARCATS_LOG";

/// Send tracing output to the log file so stdout stays free for results.
///
/// Keep the returned guard alive until exit; dropping it flushes the writer.
pub fn init(log: &LogConfig) -> Result<WorkerGuard> {
  let path = log_path(log)?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", parent.display(), e))?;
  }

  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(filter(&log.level))
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(guard)
}

fn log_path(log: &LogConfig) -> Result<PathBuf> {
  match &log.file {
    Some(path) => Ok(path.clone()),
    None => Ok(config::data_dir()?.join("starcats.log")),
  }
}

/// STARCATS_LOG wins; otherwise the configured level, then "info".
fn filter(level: &str) -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_new(level))
    .unwrap_or_else(|_| EnvFilter::new("info"))
}
