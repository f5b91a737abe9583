//! Error taxonomy shared by the guard, the index, and the mutation executor.
//!
//! Every failure carries a stable snake_case [`kind`](FsError::kind) code.
//! The tool layer renders errors as `Error [<kind>]: <message>` so an agent
//! can branch on the code without parsing prose.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = FsError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("already exists: {} (pass overwrite=true or append=true)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("wrong type: {} is a {actual}, expected a {expected}", path.display())]
    WrongType {
        path: PathBuf,
        expected: EntryKind,
        actual: EntryKind,
    },

    #[error("access denied: {} is outside the allowed roots", .0.display())]
    AccessDenied(PathBuf),

    #[error("destination exists: {} (pass overwrite=true to replace it)", .0.display())]
    OverwriteDenied(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {:.0}s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("operation cancelled")]
    Cancelled,
}

/// File-or-directory discriminator used by [`FsError::WrongType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::Symlink => write!(f, "symbolic link"),
            EntryKind::Other => write!(f, "special file"),
        }
    }
}

impl EntryKind {
    /// Kind of an entry. Only metadata from `symlink_metadata` can report
    /// [`EntryKind::Symlink`].
    pub fn of(meta: &std::fs::Metadata) -> Self {
        if meta.file_type().is_symlink() {
            EntryKind::Symlink
        } else if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        }
    }
}

impl FsError {
    /// Map an OS error onto the taxonomy, keeping the path for context.
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path),
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path),
            _ => FsError::Io { path, source: err },
        }
    }

    pub fn wrong_type(path: impl Into<PathBuf>, expected: EntryKind, actual: EntryKind) -> Self {
        FsError::WrongType {
            path: path.into(),
            expected,
            actual,
        }
    }

    /// A blocking worker panicked or was aborted before reporting back.
    pub(crate) fn worker(err: tokio::task::JoinError) -> Self {
        FsError::Io {
            path: PathBuf::new(),
            source: io::Error::other(err),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound(_) => "not_found",
            FsError::AlreadyExists(_) => "already_exists",
            FsError::WrongType { .. } => "wrong_type",
            FsError::AccessDenied(_) => "access_denied",
            FsError::OverwriteDenied(_) => "overwrite_denied",
            FsError::InvalidArgument(_) => "invalid_argument",
            FsError::Io { .. } => "io_failure",
            FsError::TimedOut(_) => "timed_out",
            FsError::Cancelled => "cancelled",
        }
    }

    /// Render as a tool result string.
    pub fn to_tool_error(&self) -> String {
        format!("Error [{}]: {self}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_io_maps_not_found() {
        let err = FsError::from_io("/x", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn from_io_maps_already_exists() {
        let err = FsError::from_io("/x", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(err, FsError::AlreadyExists(_)));
    }

    #[test]
    fn from_io_keeps_other_errors_as_io_failure() {
        let err = FsError::from_io("/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.kind(), "io_failure");
        assert!(err.to_string().contains("/x"));
    }

    #[test]
    fn os_timeout_is_an_io_failure_not_a_tool_timeout() {
        let err = FsError::from_io("/mnt/share/a.txt", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(err.kind(), "io_failure");
        let rendered = err.to_tool_error();
        assert!(rendered.contains("/mnt/share/a.txt"), "{rendered}");
        assert!(!rendered.contains("0s"), "{rendered}");
    }

    #[test]
    fn tool_error_carries_kind_code() {
        let err = FsError::wrong_type("/data/dir", EntryKind::File, EntryKind::Directory);
        let rendered = err.to_tool_error();
        assert!(rendered.starts_with("Error [wrong_type]: "));
        assert!(rendered.contains("is a directory, expected a file"));
    }
}
