//! Logging setup.
//!
//! The library itself only emits `tracing` events. Applications that want the
//! classic behavior of a dedicated client log file call [`init_logging`] once at
//! startup.

use crate::config::Configuration;
use crate::error::{AnnotationError, Result};
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// The configured log file
    File(PathBuf),
    /// Standard error, used when the log file cannot be opened
    Stderr,
}

/// Level used for a configuration: DEBUG in debug mode, INFO otherwise.
pub fn log_level(config: &Configuration) -> Level {
    if config.debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install a global `tracing` subscriber writing to the configured log file.
///
/// The parent directory is created if missing. When the file still cannot be
/// opened, output goes to stderr instead.
///
/// # Errors
///
/// [`AnnotationError::Config`] if a global subscriber is already installed.
pub fn init_logging(config: &Configuration) -> Result<LogDestination> {
    let level = log_level(config);
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    match open_log_file(config) {
        Some((path, file)) => {
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| AnnotationError::Config(e.to_string()))?;
            Ok(LogDestination::File(path))
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| AnnotationError::Config(e.to_string()))?;
            Ok(LogDestination::Stderr)
        }
    }
}

fn open_log_file(config: &Configuration) -> Option<(PathBuf, File)> {
    let path = std::path::absolute(&config.log_file).ok()?;
    if let Some(parent) = path.parent() {
        if !parent.is_dir() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!("could not create log directory {}: {}", parent.display(), e);
            }
        }
    }
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            tracing::debug!("could not open log file {}: {}", path.display(), e);
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        let mut config = Configuration::default();
        assert_eq!(log_level(&config), Level::INFO);
        config.debug = true;
        assert_eq!(log_level(&config), Level::DEBUG);
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = std::env::temp_dir().join(format!("triannon-log-{}", std::process::id()));
        let mut config = Configuration::default();
        config.log_file = dir.join("nested").join("client.log");

        let (path, _file) = open_log_file(&config).unwrap();
        assert!(path.is_file());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unusable_log_directory_is_reported() {
        let blocker = std::env::temp_dir().join(format!("triannon-log-file-{}", std::process::id()));
        fs::write(&blocker, b"not a directory").unwrap();
        let mut config = Configuration::default();
        config.log_file = blocker.join("nested").join("client.log");

        let (logs, _guard) = capture::capture_logs_at(Level::DEBUG);
        assert!(open_log_file(&config).is_none());
        let output = logs.contents();
        assert!(output.contains("could not create log directory"), "{}", output);
        assert!(output.contains("could not open log file"), "{}", output);
        let _ = fs::remove_file(blocker);
    }
}
