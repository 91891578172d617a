use std::fs;
use std::path::Path;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_FILE;

/// Daily-rotated appender under `dir`, creating the directory first.
fn open_log_file(dir: &Path) -> Result<RollingFileAppender, String> {
    fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .map_err(|e| e.to_string())
}

/// Initializes logging: console output always, plus a daily-rotated JSON log
/// under `log_dir` when one is given.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole run. If the log directory cannot be used the run continues with
/// console logging and a warning.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Respect RUST_LOG if set; otherwise info for everything
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("violations_scraper=info,info"));

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    let mut file_error = None;
    let (file_layer, guard) = match log_dir.map(|dir| (dir, open_log_file(dir))) {
        Some((_, Ok(appender))) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        Some((dir, Err(e))) => {
            file_error = Some((dir, e));
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if let Some((dir, e)) = file_error {
        warn!("File logging disabled, cannot use {}: {}", dir.display(), e);
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("logs").join("nested");
        assert!(open_log_file(&dir).is_ok());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_open_log_file_reports_unusable_directory() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file in the way").unwrap();

        let err = open_log_file(&blocker.join("logs")).unwrap_err();
        assert!(!err.is_empty());
    }
}
