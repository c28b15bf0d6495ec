//! File logging. The terminal belongs to the TUI, so everything goes to a
//! daily-rolling file instead of stderr.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter (e.g. `reel=debug`).
pub const LOG_ENV: &str = "REEL_LOG";

const DEFAULT_FILTER: &str = "reel=info";

/// Install the global subscriber writing to `<dir>/reel.log.<date>`.
/// Keep the returned guard alive for the life of the program so buffered
/// lines are flushed on exit.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
  let appender = tracing_appender::rolling::daily(dir, "reel.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.into()))
    .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
