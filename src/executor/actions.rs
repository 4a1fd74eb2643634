//! Applies Remove verdicts to disk: delete, quarantine, or simulate.
//!
//! Mutation discipline: in test mode no code path in this module touches the
//! filesystem; every branch short-circuits to `Simulated` before any rename
//! or unlink. Failures are isolated per item and surfaced as `Failed`
//! outcomes, never as run-fatal errors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::errors::SswError;
use crate::executor::quarantine_root;
use crate::scanner::walker::CandidateItem;

/// What happened to one Remove-verdict item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Test mode: the action was reported, the filesystem untouched.
    Simulated,
    RemovedFile,
    RemovedDirectory,
    /// Moved into the quarantine folder at the recorded destination.
    Quarantined { dest: PathBuf },
    /// Matched, but the per-kind removal toggle is off.
    SkippedByToggle,
    /// The action failed; the run continues and degrades to partial.
    Failed { code: String, reason: String },
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-run executor holding the mode switches and quarantine destination.
#[derive(Debug)]
pub struct ActionExecutor {
    quarantine_base: PathBuf,
    test_mode: bool,
    quarantine_mode: bool,
    remove_files: bool,
    remove_directories: bool,
}

impl ActionExecutor {
    #[must_use]
    pub fn new(config: &Config, root: &Path) -> Self {
        Self {
            quarantine_base: quarantine_root(root),
            test_mode: config.modes.test_mode,
            quarantine_mode: config.modes.quarantine_mode,
            remove_files: config.rules.remove_files,
            remove_directories: config.rules.remove_directories,
        }
    }

    /// Apply the removal action for one item. The verdict has already been
    /// decided; this only executes it under the configured modes.
    pub fn apply(&self, item: &CandidateItem) -> ActionOutcome {
        if item.is_dir() && !self.remove_directories {
            return ActionOutcome::SkippedByToggle;
        }
        if !item.is_dir() && !self.remove_files {
            return ActionOutcome::SkippedByToggle;
        }
        if self.test_mode {
            return ActionOutcome::Simulated;
        }
        if self.quarantine_mode {
            self.quarantine(item)
        } else {
            self.delete(item)
        }
    }

    fn delete(&self, item: &CandidateItem) -> ActionOutcome {
        let result = if item.is_dir() {
            fs::remove_dir_all(&item.path)
        } else {
            fs::remove_file(&item.path)
        };
        if let Err(source) = result {
            return failed(SswError::io(&item.path, source));
        }
        // Verify the item is actually gone before counting it removed.
        if item.path.symlink_metadata().is_ok() {
            return ActionOutcome::Failed {
                code: "SSW-3002".to_string(),
                reason: format!("{} still present after removal", item.path.display()),
            };
        }
        if item.is_dir() {
            ActionOutcome::RemovedDirectory
        } else {
            ActionOutcome::RemovedFile
        }
    }

    fn quarantine(&self, item: &CandidateItem) -> ActionOutcome {
        let dest = self.quarantine_base.join(&item.rel_path);
        let Some(dest_parent) = dest.parent() else {
            return ActionOutcome::Failed {
                code: "SSW-3900".to_string(),
                reason: format!("no parent for quarantine target {}", dest.display()),
            };
        };
        if let Err(source) = fs::create_dir_all(dest_parent) {
            return failed(SswError::io(dest_parent, source));
        }
        let dest = next_free_path(dest);
        match fs::rename(&item.path, &dest) {
            Ok(()) => ActionOutcome::Quarantined { dest },
            Err(source) => failed(SswError::io(&item.path, source)),
        }
    }
}

fn failed(err: SswError) -> ActionOutcome {
    ActionOutcome::Failed {
        code: err.code().to_string(),
        reason: err.to_string(),
    }
}

/// Resolve a name collision inside the quarantine by appending a numeric
/// suffix after the full name: `clip.mkv` becomes `clip.mkv.1`, then
/// `clip.mkv.2`, and so on. Keeping the original name intact makes manual
/// restores unambiguous.
fn next_free_path(dest: PathBuf) -> PathBuf {
    if dest.symlink_metadata().is_err() {
        return dest;
    }
    let base = dest.as_os_str().to_owned();
    for n in 1u32.. {
        let mut candidate = base.clone();
        candidate.push(format!(".{n}"));
        let candidate = PathBuf::from(candidate);
        if candidate.symlink_metadata().is_err() {
            return candidate;
        }
    }
    unreachable!("u32 suffix space exhausted")
}
