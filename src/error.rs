//! Per-file errors and actionable messages
//!
//! Everything that can go wrong while rewriting a single file is a
//! [`RewriteError`]. The batch loop reports these and moves on to the next
//! file; anything above that boundary uses `anyhow`.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    ReadError { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    WriteError { path: PathBuf, source: io::Error },
}

impl RewriteError {
    /// Classify a read failure; a missing file gets its own kind
    pub fn read(path: &Path, source: io::Error) -> Self {
        if is_not_found(&source) {
            RewriteError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RewriteError::ReadError {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn write(path: &Path, source: io::Error) -> Self {
        RewriteError::WriteError {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RewriteError::FileNotFound { path }
            | RewriteError::ReadError { path, .. }
            | RewriteError::WriteError { path, .. } => path,
        }
    }

    /// Suggested fixes for the failure, when there are any worth showing
    pub fn hint(&self) -> Option<String> {
        match self {
            RewriteError::FileNotFound { path } => {
                Some(not_found_error(path, "reading target file"))
            }
            RewriteError::ReadError { path, source } if is_permission_denied(source) => {
                Some(permission_error(path, "reading"))
            }
            RewriteError::WriteError { path, source } if is_permission_denied(source) => {
                Some(permission_error(path, "writing"))
            }
            _ => None,
        }
    }
}

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Create an enhanced error message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    let parent_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. The file is replaced through a temp file, so the directory must be writable:\n   \
         chmod u+w '{}'\n\
         3. Skip the file by removing it from the target list",
        operation,
        path.display(),
        path.display(),
        parent_dir
    )
}

/// Create an enhanced error message for file not found issues
pub fn not_found_error(path: &Path, context: &str) -> String {
    format!(
        "File not found: '{}'\n\n\
         Context: {}\n\n\
         Possible fixes:\n\
         1. Check the path is relative to the project root (see --root)\n\
         2. Update the target list with --files-from or [targets] in .typeshift.toml\n\
         3. The file may already have been moved or deleted",
        path.display(),
        context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_read_classifies_not_found() {
        let err =
            RewriteError::read(Path::new("a.ts"), io::Error::new(ErrorKind::NotFound, "gone"));
        assert!(matches!(err, RewriteError::FileNotFound { .. }));
        assert_eq!(err.path(), Path::new("a.ts"));
        assert_eq!(err.to_string(), "file not found: a.ts");
    }

    #[test]
    fn test_read_keeps_other_errors() {
        let err = RewriteError::read(
            Path::new("b.ts"),
            io::Error::new(ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        );
        assert!(matches!(err, RewriteError::ReadError { .. }));
        assert!(err.to_string().contains("valid UTF-8"));
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_write_permission_hint() {
        let err = RewriteError::write(
            Path::new("/tmp/c.ts"),
            io::Error::new(ErrorKind::PermissionDenied, "access denied"),
        );
        assert_eq!(err.path(), Path::new("/tmp/c.ts"));
        let hint = err.hint().unwrap();
        assert!(hint.contains("Permission denied when writing"));
        assert!(hint.contains("/tmp/c.ts"));
    }

    #[test]
    fn test_is_permission_denied() {
        let perm_err = io::Error::new(ErrorKind::PermissionDenied, "access denied");
        assert!(is_permission_denied(&perm_err));

        let not_found_err = io::Error::new(ErrorKind::NotFound, "not found");
        assert!(!is_permission_denied(&not_found_err));
    }

    #[test]
    fn test_not_found_error_formatting() {
        let path = Path::new("src/utils/fs/$.test.ts");
        let msg = not_found_error(path, "reading target file");
        assert!(msg.contains("File not found"));
        assert!(msg.contains("src/utils/fs/$.test.ts"));
        assert!(msg.contains("Possible fixes"));
    }
}
