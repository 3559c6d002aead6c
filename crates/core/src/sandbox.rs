//! Path confinement for the sandbox root.
//!
//! Every caller-supplied path must pass through [`Sandbox::resolve`] before
//! any filesystem operation touches it.

use std::path::{Component, Path, PathBuf};

use crate::FsError;

/// A fixed root directory that all resolved paths are confined to.
///
/// The root is canonicalized once at construction and never changes for the
/// lifetime of the value. Tests can create independent sandboxes against
/// distinct temporary roots.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Sandbox, FsError> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|e| FsError::from_io(e, root))?;
        if !root.is_dir() {
            return Err(FsError::NotADirectory(root));
        }
        Ok(Sandbox { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied path against the root.
    ///
    /// The path is joined onto the root and normalized lexically, so targets
    /// that do not exist yet still resolve. The result is accepted only if it
    /// is the root itself or a descendant of it; anything else fails with
    /// [`FsError::PathEscape`]. An absolute path is accepted iff it already
    /// lies inside the root.
    ///
    /// Normalization does not follow symlinks: a link inside the root that
    /// points outside it is not detected by this check.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, FsError> {
        if raw.contains('\0') {
            return Err(FsError::InvalidArgument("path contains a NUL byte".into()));
        }
        let resolved = normalize(&self.root.join(raw));
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(FsError::PathEscape(resolved))
        }
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding component, without touching the filesystem.
///
/// Normalization must happen before the prefix check in [`Sandbox::resolve`]:
/// a path like `"subdir/../../secret"` looks rooted until the `..` segments
/// are folded.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
