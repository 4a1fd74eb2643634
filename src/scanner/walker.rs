//! Sequential download-tree scanner.
//!
//! One pass over the root produces the flat candidate list the rule engine
//! evaluates. Each invocation is scoped to a single completed download, so
//! the walk is deliberately sequential: failure isolation and log ordering
//! stay deterministic without any coordination.

#![allow(missing_docs)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SswError};
use crate::core::paths::normalized_extension;
use crate::executor::QUARANTINE_DIR_NAME;
use crate::scanner::guard::PathGuard;

/// Kind of a discovered filesystem item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Directory,
}

/// One file or directory discovered during the scan pass.
///
/// Created once, immutable thereafter, discarded at end of run. Directory
/// sizes are not eagerly computed; only file sizes feed the size rules.
#[derive(Debug, Clone)]
pub struct CandidateItem {
    /// Absolute path (root-descendant, guard-validated).
    pub path: PathBuf,
    /// Path relative to the download root.
    pub rel_path: PathBuf,
    pub kind: ItemKind,
    /// On-disk size for files; zero for directories.
    pub size_bytes: u64,
    /// Lower-cased extension with leading dot, files only.
    pub extension: Option<String>,
    /// Immediate parent directory, used for sibling grouping only.
    pub parent: PathBuf,
}

impl CandidateItem {
    /// Base name used by name-based rules (full directory name for dirs).
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, ItemKind::Directory)
    }
}

/// An item the guard refused to touch (symlink or escape), reported rather
/// than silently dropped.
#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub code: String,
    pub reason: String,
}

/// Result of the single scan pass.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Candidates sorted by path, parents before their children.
    pub items: Vec<CandidateItem>,
    pub skipped_unsafe: Vec<SkippedItem>,
}

/// Walks the guarded root once and collects candidates.
pub struct Scanner<'a> {
    guard: &'a PathGuard,
}

impl<'a> Scanner<'a> {
    pub fn new(guard: &'a PathGuard) -> Self {
        Self { guard }
    }

    /// Perform the full scan. Unreadable subtrees are skipped gracefully;
    /// only a failure to read the root itself is fatal.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();
        let root = self.guard.root().to_path_buf();
        let mut queue: Vec<(PathBuf, usize)> = vec![(root.clone(), 0)];

        while let Some((dir, depth)) = queue.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::PermissionDenied && depth > 0 => continue,
                Err(err) if err.kind() == ErrorKind::NotFound && depth > 0 => continue,
                Err(source) => return Err(SswError::Io { path: dir, source }),
            };

            for entry_result in entries {
                let Ok(entry) = entry_result else {
                    continue;
                };
                let path = entry.path();

                // The quarantine folder lives under the root but is never a
                // candidate; it would otherwise match its own contents.
                if depth == 0
                    && entry.file_name().to_string_lossy() == QUARANTINE_DIR_NAME
                {
                    continue;
                }

                let Ok(ft) = entry.file_type() else {
                    continue;
                };

                // Symlinks are never followed and never classified.
                if ft.is_symlink() {
                    outcome.skipped_unsafe.push(SkippedItem {
                        path: path.clone(),
                        code: "SSW-2002".to_string(),
                        reason: format!("refusing to follow link at {}", path.display()),
                    });
                    continue;
                }

                if let Err(err) = self.guard.check(&path) {
                    outcome.skipped_unsafe.push(SkippedItem {
                        path: path.clone(),
                        code: err.code().to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }

                let rel_path = self.guard.relative(&path)?;
                let parent = path.parent().unwrap_or(&root).to_path_buf();

                if ft.is_dir() {
                    outcome.items.push(CandidateItem {
                        path: path.clone(),
                        rel_path,
                        kind: ItemKind::Directory,
                        size_bytes: 0,
                        extension: None,
                        parent,
                    });
                    queue.push((path, depth + 1));
                } else {
                    let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    outcome.items.push(CandidateItem {
                        extension: normalized_extension(&path),
                        path,
                        rel_path,
                        kind: ItemKind::File,
                        size_bytes,
                        parent,
                    });
                }
            }
        }

        // Parents sort before their children, which lets the action pass
        // skip descendants of a bulk-removed directory with a prefix check.
        outcome.items.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scan(tmp: &TempDir) -> ScanOutcome {
        let guard = PathGuard::new(tmp.path()).unwrap();
        Scanner::new(&guard).scan().unwrap()
    }

    #[test]
    fn collects_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Sample")).unwrap();
        fs::write(tmp.path().join("movie.mkv"), vec![0u8; 2048]).unwrap();
        fs::write(tmp.path().join("Sample").join("clip.mkv"), b"x").unwrap();

        let outcome = scan(&tmp);
        assert_eq!(outcome.items.len(), 3);

        let file = outcome
            .items
            .iter()
            .find(|i| i.name() == "movie.mkv")
            .unwrap();
        assert_eq!(file.kind, ItemKind::File);
        assert_eq!(file.size_bytes, 2048);
        assert_eq!(file.extension.as_deref(), Some(".mkv"));

        let dir = outcome.items.iter().find(|i| i.name() == "Sample").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.size_bytes, 0);
        assert!(dir.extension.is_none());
    }

    #[test]
    fn rel_paths_are_root_relative() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("cd1")).unwrap();
        fs::write(tmp.path().join("cd1").join("a.mkv"), b"x").unwrap();

        let outcome = scan(&tmp);
        let file = outcome.items.iter().find(|i| i.name() == "a.mkv").unwrap();
        assert_eq!(file.rel_path, Path::new("cd1/a.mkv"));
    }

    #[test]
    fn parents_sort_before_children() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b").join("nested")).unwrap();
        fs::write(tmp.path().join("b").join("nested").join("f.mkv"), b"x").unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();

        let outcome = scan(&tmp);
        let positions: Vec<_> = outcome.items.iter().map(|i| i.path.clone()).collect();
        let dir_pos = positions
            .iter()
            .position(|p| p == &tmp.path().join("b"))
            .unwrap();
        let child_pos = positions
            .iter()
            .position(|p| p.ends_with("f.mkv"))
            .unwrap();
        assert!(dir_pos < child_pos);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_not_classified() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real.mkv");
        fs::write(&target, b"x").unwrap();
        std::os::unix::fs::symlink(&target, tmp.path().join("sample.mkv")).unwrap();

        let outcome = scan(&tmp);
        assert_eq!(outcome.skipped_unsafe.len(), 1);
        assert_eq!(outcome.skipped_unsafe[0].code, "SSW-2002");
        assert!(!outcome.items.iter().any(|i| i.name() == "sample.mkv"));
    }

    #[test]
    fn quarantine_folder_is_never_scanned() {
        let tmp = TempDir::new().unwrap();
        let q = tmp.path().join(QUARANTINE_DIR_NAME);
        fs::create_dir(&q).unwrap();
        fs::write(q.join("old.sample.mkv"), b"x").unwrap();
        fs::write(tmp.path().join("movie.mkv"), b"x").unwrap();

        let outcome = scan(&tmp);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].name(), "movie.mkv");
    }

    #[test]
    fn empty_root_yields_empty_outcome() {
        let tmp = TempDir::new().unwrap();
        let outcome = scan(&tmp);
        assert!(outcome.items.is_empty());
        assert!(outcome.skipped_unsafe.is_empty());
    }
}
