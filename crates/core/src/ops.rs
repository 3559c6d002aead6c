//! Filesystem operation executors.
//!
//! Every function takes paths already resolved by
//! [`Sandbox::resolve`](crate::sandbox::Sandbox::resolve) and validated
//! parameters; none does its own path arithmetic. Operations are
//! single-attempt: a transient OS error surfaces immediately as [`FsError`].

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::FsError;

/// Upper bound on concurrent per-entry stat calls in [`list`].
const STAT_CONCURRENCY: usize = 16;

/// Content encoding for file reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Base64,
}

impl Encoding {
    /// Parse an optional encoding name, defaulting to UTF-8.
    ///
    /// `"utf-8"` is accepted as an alias for the canonical `"utf8"`.
    pub fn parse(name: Option<&str>) -> Result<Encoding, FsError> {
        match name.unwrap_or("utf8") {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "base64" => Ok(Encoding::Base64),
            other => Err(FsError::InvalidArgument(format!(
                "unknown encoding {other:?}, expected \"utf8\" or \"base64\""
            ))),
        }
    }
}

/// A single directory entry as reported by [`list`].
#[derive(Debug, Serialize)]
pub struct Entry {
    /// File name without any directory components.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(rename = "mtimeMs")]
    pub mtime_ms: u64,
}

/// Coarse classification of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Metadata for a single path as reported by [`stat`].
#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
    #[cfg(unix)]
    pub permissions: String,
}

/// List the direct children of a directory, one level deep.
///
/// Entries come back in filesystem enumeration order. Per-entry stat lookups
/// run concurrently with a fixed bound; the first failing stat fails the
/// whole listing rather than producing a partial result.
pub async fn list(path: &Path) -> Result<Vec<Entry>, FsError> {
    let mut read_dir = tokio::fs::read_dir(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    let mut children = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| FsError::from_io(e, path))?
    {
        children.push(entry);
    }

    futures::stream::iter(children.into_iter().map(|entry| async move {
        let meta = entry
            .metadata()
            .await
            .map_err(|e| FsError::from_io(e, &entry.path()))?;
        let kind = if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        Ok(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            size: meta.len(),
            mtime_ms: millis_since_epoch(meta.modified().ok()),
        })
    }))
    .buffered(STAT_CONCURRENCY)
    .try_collect()
    .await
}

/// Read a file and return its contents in the requested encoding.
///
/// UTF-8 decoding is lossy: invalid sequences are replaced rather than
/// failing the read.
pub async fn read(path: &Path, encoding: Encoding) -> Result<String, FsError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    Ok(match encoding {
        Encoding::Utf8 => String::from_utf8_lossy(&bytes).into_owned(),
        Encoding::Base64 => BASE64.encode(&bytes),
    })
}

/// Write `data` to a file, decoding it per `encoding` first.
///
/// With `append` the file is created if absent and extended otherwise;
/// without it any existing content is replaced. The parent directory must
/// already exist.
pub async fn write(
    path: &Path,
    data: &str,
    encoding: Encoding,
    append: bool,
) -> Result<(), FsError> {
    let bytes = match encoding {
        Encoding::Utf8 => data.as_bytes().to_vec(),
        Encoding::Base64 => BASE64
            .decode(data)
            .map_err(|e| FsError::InvalidArgument(format!("invalid base64 data: {e}")))?,
    };
    if append {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        file.flush().await.map_err(|e| FsError::from_io(e, path))?;
    } else {
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
    }
    Ok(())
}

/// Create a directory.
///
/// With `recursive` all missing ancestors are created and an existing
/// directory is not an error; without it the parent must exist and the
/// target must not.
pub async fn mkdir(path: &Path, recursive: bool) -> Result<(), FsError> {
    let result = if recursive {
        tokio::fs::create_dir_all(path).await
    } else {
        tokio::fs::create_dir(path).await
    };
    result.map_err(|e| FsError::from_io(e, path))
}

/// Atomically move `from` to `to`.
///
/// Same-filesystem renames replace an existing destination file; a rename
/// across device boundaries is not supported and fails with
/// [`FsError::CrossDevice`].
pub async fn rename(from: &Path, to: &Path) -> Result<(), FsError> {
    tokio::fs::rename(from, to).await.map_err(|e| {
        if e.kind() == io::ErrorKind::CrossesDevices {
            FsError::CrossDevice {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            }
        } else {
            FsError::from_io(e, from)
        }
    })
}

/// Delete a file or directory.
///
/// A file is deleted regardless of `recursive`. A directory is deleted with
/// its contents when `recursive` is set, and only when empty otherwise.
pub async fn remove(path: &Path, recursive: bool) -> Result<(), FsError> {
    let meta = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    let result = if meta.is_dir() {
        if recursive {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_dir(path).await
        }
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| FsError::from_io(e, path))
}

/// Get metadata for a single path without following symlinks.
pub async fn stat(path: &Path) -> Result<FileInfo, FsError> {
    let meta = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    Ok(FileInfo {
        size: meta.len(),
        modified: rfc3339(meta.modified().ok()),
        created: rfc3339(meta.created().ok()),
        is_dir: meta.is_dir(),
        is_file: meta.is_file(),
        is_symlink: meta.is_symlink(),
        #[cfg(unix)]
        permissions: {
            use std::os::unix::fs::PermissionsExt;
            format!("{:o}", meta.permissions().mode())
        },
    })
}

/// Search for paths matching a glob pattern under `base`.
///
/// `base` must be a resolved directory inside `root`. Matches are filtered
/// to paths inside `root` and reported root-relative; `excludes` patterns
/// are matched against the relative form. Unreadable entries are skipped.
pub fn search(
    root: &Path,
    base: &Path,
    pattern: &str,
    excludes: &[String],
) -> Result<Vec<String>, FsError> {
    let full_pattern = base.join(pattern);
    let matches = glob::glob(&full_pattern.to_string_lossy())
        .map_err(|e| FsError::InvalidArgument(format!("invalid glob pattern: {e}")))?;

    let mut hits = Vec::new();
    for entry in matches {
        let path: PathBuf = match entry {
            Ok(p) => p,
            Err(_) => continue,
        };
        if !path.starts_with(root) {
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        let excluded = excludes.iter().any(|ex| {
            glob::Pattern::new(ex)
                .map(|p| p.matches(&relative))
                .unwrap_or(false)
        });
        if !excluded {
            hits.push(relative);
        }
    }
    Ok(hits)
}

fn millis_since_epoch(t: Option<SystemTime>) -> u64 {
    t.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn rfc3339(t: Option<SystemTime>) -> Option<String> {
    t.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| chrono::DateTime::from_timestamp(d.as_secs() as i64, d.subsec_nanos()))
        .map(|dt| dt.to_rfc3339())
}
