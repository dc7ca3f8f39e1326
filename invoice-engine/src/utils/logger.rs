//! Logging Infrastructure
//!
//! Console output plus, when a log directory is given, two daily rotating
//! files:
//! - `app/`: everything except the audit target, pruned by [`cleanup_old_logs`]
//! - `audit/`: change events recorded by the audit trail, never pruned

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::filter_fn, fmt, prelude::*};

/// Target used for audit trail records
pub const AUDIT_TARGET: &str = "audit";

const APP_LOG_PREFIX: &str = "app";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// ```no_run
/// // Development: pretty console only
/// invoice_engine::utils::logger::init_logger_with_file("debug", false, None)?;
///
/// // Production: JSON console and rotating files
/// invoice_engine::utils::logger::init_logger_with_file("info", true, Some("./logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);
    if json_format {
        layers.push(
            console
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_filter(filter())
                .boxed(),
        );
    } else {
        layers.push(console.with_filter(filter()).boxed());
    }

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;

        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, APP_LOG_PREFIX);
        let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");

        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(filter())
                .with_filter(filter_fn(|meta| meta.target() != AUDIT_TARGET))
                .boxed(),
        );
        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(audit_log))
                .with_filter(filter_fn(|meta| meta.target() == AUDIT_TARGET))
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Delete application log files older than `keep_days`
///
/// Files are matched by the `app.YYYY-MM-DD` names the daily appender
/// produces. Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: i64) -> anyhow::Result<usize> {
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Local::now().date_naive() - chrono::Duration::days(keep_days);
    let mut removed = 0;

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date_part) = name.strip_prefix("app.")
            && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_expired_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("app");
        fs::create_dir_all(&app_dir).unwrap();

        let today = Local::now().date_naive();
        let old = today - chrono::Duration::days(30);
        let old_name = format!("app.{}", old.format("%Y-%m-%d"));
        let fresh_name = format!("app.{}", today.format("%Y-%m-%d"));
        for name in [&old_name, &fresh_name, &"notes.txt".to_string()] {
            fs::write(app_dir.join(name), b"{}").unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), 14).unwrap();

        assert_eq!(removed, 1);
        assert!(!app_dir.join(&old_name).exists());
        assert!(app_dir.join(&fresh_name).exists());
        assert!(app_dir.join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(dir.path(), 14).unwrap(), 0);
    }
}
