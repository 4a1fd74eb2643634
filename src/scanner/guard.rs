//! Path Guard: confines every filesystem access to the download root.
//!
//! Contract: given the root and any candidate path, `check` succeeds only
//! when the path is a descendant of the root and no component below the root
//! is a symbolic link (or platform junction). The guard is invoked before any
//! read, classification, or mutation touches a path; unsafe items are
//! reported as skipped, never silently dropped and never followed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SswError};
use crate::core::paths::{normalize_syntactic, resolve_absolute_path};

/// Root-confined path validator.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Resolve and validate the download root. The root itself is
    /// symlink-resolved once here; it is never a remediation target.
    pub fn new(root: &Path) -> Result<Self> {
        let resolved = resolve_absolute_path(root);
        let meta = fs::metadata(&resolved).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SswError::InvalidRoot {
                    path: resolved.clone(),
                }
            } else {
                SswError::Io {
                    path: resolved.clone(),
                    source,
                }
            }
        })?;
        if !meta.is_dir() {
            return Err(SswError::InvalidRoot { path: resolved });
        }
        Ok(Self { root: resolved })
    }

    /// The resolved root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a candidate path for containment and link safety.
    ///
    /// Errors with `PathEscape` when the normalized path is not a descendant
    /// of the root, or `UnsafeLink` when any component between the root and
    /// the path (inclusive) is a symbolic link.
    pub fn check(&self, path: &Path) -> Result<()> {
        let normalized = normalize_syntactic(path);
        if normalized == self.root || !normalized.starts_with(&self.root) {
            return Err(SswError::PathEscape {
                path: normalized,
                root: self.root.clone(),
            });
        }

        // Walk each component below the root. Any link along the chain could
        // redirect a later delete/move outside the tree, so the whole chain
        // must be link-free.
        let mut current = self.root.clone();
        let relative = normalized
            .strip_prefix(&self.root)
            .map_err(|_| SswError::PathEscape {
                path: normalized.clone(),
                root: self.root.clone(),
            })?
            .to_path_buf();
        for component in relative.components() {
            current.push(component);
            let meta = fs::symlink_metadata(&current).map_err(|source| SswError::Io {
                path: current.clone(),
                source,
            })?;
            if meta.file_type().is_symlink() {
                return Err(SswError::UnsafeLink { path: current });
            }
        }

        Ok(())
    }

    /// Compute the root-relative path for a contained candidate.
    pub fn relative(&self, path: &Path) -> Result<PathBuf> {
        normalize_syntactic(path)
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| SswError::PathEscape {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
    }
}
