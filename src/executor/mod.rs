//! Remediation: applying verdicts to disk and aging out the quarantine.

pub mod actions;
pub mod purge;

use std::path::{Path, PathBuf};

/// Name of the quarantine folder created directly under the download root.
pub const QUARANTINE_DIR_NAME: &str = "_samples_quarantine";

/// Quarantine folder path for a given download root.
#[must_use]
pub fn quarantine_root(root: &Path) -> PathBuf {
    root.join(QUARANTINE_DIR_NAME)
}
