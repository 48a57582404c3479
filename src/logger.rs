//! Debug logging support for typeshift
//!
//! When logging is enabled (`--verbose` or `[logging] debug = true`), file
//! processing is traced to `~/.typeshift/typeshift.log`. `RUST_LOG` overrides
//! the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Initialize the debug logging system
///
/// Returns the path to the log file, or None if logging is not enabled or
/// the log file could not be opened.
pub fn init_logging(enabled: bool, verbose: bool) -> Result<Option<PathBuf>> {
    if !enabled && !verbose {
        return Ok(None);
    }

    let Some((log_path, log_file)) = open_log_file(log_path()) else {
        return Ok(None);
    };

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(env_filter(verbose));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(Some(log_path))
}

/// Create the log directory and open the log for appending
///
/// Logging is optional: any failure is reported once on stderr and the
/// run continues without it.
fn open_log_file(log_path: Result<PathBuf>) -> Option<(PathBuf, File)> {
    let opened = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        Ok((path, file))
    });

    match opened {
        Ok(opened) => Some(opened),
        Err(e) => {
            eprintln!("Warning: Could not create log file: {:#}", e);
            None
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "typeshift=debug"
    } else {
        "typeshift=info"
    }
}

/// Get the log file path
pub fn log_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".typeshift").join("typeshift.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path() {
        if let Ok(path) = log_path() {
            assert!(path.ends_with(".typeshift/typeshift.log"));
        }
    }

    #[test]
    fn test_init_logging_disabled() {
        let result = init_logging(false, false);
        assert_eq!(result.unwrap(), None, "Should return None when logging is disabled");
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(".typeshift").join("typeshift.log");

        let (opened, _file) = open_log_file(Ok(path.clone())).unwrap();
        assert_eq!(opened, path);
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_falls_back_when_directory_unusable() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let not_a_dir = temp_dir.path().join("home");
        fs::write(&not_a_dir, "regular file").unwrap();

        let path = not_a_dir.join(".typeshift").join("typeshift.log");
        assert!(open_log_file(Ok(path)).is_none());
    }

    #[test]
    fn test_open_log_file_falls_back_without_home() {
        let missing_home = Err(anyhow::anyhow!("Cannot determine home directory"));
        assert!(open_log_file(missing_home).is_none());
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "typeshift=debug");
        assert_eq!(default_directive(false), "typeshift=info");
    }
}
