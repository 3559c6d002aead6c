use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from sandbox resolution and filesystem operations.
#[derive(Error, Debug)]
pub enum FsError {
    /// The resolved path lies outside the sandbox root.
    #[error("path escape: {0} is outside the sandbox root")]
    PathEscape(PathBuf),
    /// A parameter is missing, malformed, or outside its allowed set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("directory not empty: {0}")]
    NotEmpty(PathBuf),
    /// Rename source and destination are on different filesystems.
    #[error("cross-device rename: {from} -> {to}")]
    CrossDevice { from: PathBuf, to: PathBuf },
    /// Any other OS-level failure, with the underlying message.
    #[error("{path}: {message}")]
    Unexpected { path: PathBuf, message: String },
}

impl FsError {
    /// Map an I/O error onto the taxonomy, attaching the path the operation
    /// was acting on.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> FsError {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            io::ErrorKind::NotADirectory => FsError::NotADirectory(path.to_path_buf()),
            io::ErrorKind::IsADirectory => FsError::IsADirectory(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_path_buf()),
            io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty(path.to_path_buf()),
            _ => FsError::Unexpected {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}
