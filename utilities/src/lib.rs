use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod command;
pub mod platform;

pub use command::{
    run_succeeded, settle, CommandRunner, CommandSpec, RealCommandRunner, ScriptedCommandRunner,
    ScriptedOutcome,
};
pub use platform::PlatformKind;

/// Guard for the non-blocking file writer so it is not dropped early.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
/// Ensures logging is only initialized once.
static LOG_INIT: OnceCell<()> = OnceCell::new();

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize tracing-based logging with both console and file output.
///
/// Subsequent calls are no-ops so every binary can call this helper
/// confidently and share the same configuration.
pub fn init_logging(log_path: &Path) -> Result<()> {
    LOG_INIT
        .get_or_try_init(|| configure_logging(log_path))
        .map(|_| ())
}

/// A fresh, not-yet-created scratch directory under the system temp dir.
///
/// Names are unique per process and per call so parallel tests never share state.
pub fn test_temp_path(prefix: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "{prefix}-{}-{n}-{nanos}",
        std::process::id()
    ))
}

fn configure_logging(log_path: &Path) -> Result<()> {
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| OsStr::new("terasu-controller.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep guard alive for the process lifetime.
    let _ = FILE_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
