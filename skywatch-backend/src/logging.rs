use anyhow::Context;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tokio::task;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const MAX_LOG_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 3);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

/// Daily rolling file log plus coloured stdout, both overridable by `RUST_LOG`.
///
/// Must be called from within a tokio runtime: it spawns the old-log cleanup task.
pub fn init_logging(
    log_dir: impl AsRef<Path>,
    prefix: &str,
    level: &str,
) -> anyhow::Result<LoggerGuard> {
    let log_dir = log_dir.as_ref().to_path_buf();

    let default_level = parse_level(level);

    let builder = EnvFilter::builder().with_default_directive(default_level.into());
    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
    let console_filter = builder.clone().parse_lossy(&rust_log);
    let file_filter = builder.parse_lossy(&rust_log);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create file appender")?;
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(file_filter);
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if default_level == LevelFilter::INFO && !level.eq_ignore_ascii_case("info") {
        tracing::warn!("Invalid log level '{}', defaulting to 'info'", level);
    }

    start_log_cleanup_task(log_dir, prefix.to_string());

    Ok(LoggerGuard(guard))
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn start_log_cleanup_task(log_dir: PathBuf, prefix: String) {
    task::spawn(async move {
        loop {
            if let Err(e) = cleanup_old_logs(&log_dir, &prefix, MAX_LOG_AGE) {
                tracing::warn!("Failed to delete old log file: {}", e);
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(file_name.starts_with(prefix) && file_name.ends_with(".log")) {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!("Old log file deleted: {}", file_name);
        }
    }
    Ok(removed)
}
