//! Quarantine aging: purge entries older than the configured retention.
//!
//! Age is judged on file modification time. Files past the cutoff are
//! deleted, then directories left empty by those deletions are pruned
//! bottom-up. A retention of zero days disables purging entirely.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::core::errors::SswError;
use crate::executor::quarantine_root;

const SECS_PER_DAY: u64 = 86_400;

/// Outcome of one purge pass.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub files_purged: u64,
    pub dirs_pruned: u64,
    pub failures: Vec<PurgeFailure>,
}

#[derive(Debug)]
pub struct PurgeFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl PurgeReport {
    #[must_use]
    pub fn touched_anything(&self) -> bool {
        self.files_purged > 0 || self.dirs_pruned > 0 || !self.failures.is_empty()
    }
}

/// Ages out old quarantine entries under one download root.
#[derive(Debug)]
pub struct QuarantinePurger {
    quarantine: PathBuf,
    max_age_days: u64,
}

impl QuarantinePurger {
    #[must_use]
    pub fn new(root: &Path, max_age_days: u64) -> Self {
        Self {
            quarantine: quarantine_root(root),
            max_age_days,
        }
    }

    /// Run the purge pass. A missing quarantine folder or a zero retention
    /// is a quiet no-op; per-entry failures are collected, never fatal.
    #[must_use]
    pub fn purge(&self) -> PurgeReport {
        let mut report = PurgeReport::default();
        if self.max_age_days == 0 || !self.quarantine.is_dir() {
            return report;
        }
        let cutoff = SystemTime::now() - Duration::from_secs(self.max_age_days * SECS_PER_DAY);
        self.purge_dir(&self.quarantine, cutoff, &mut report);
        report
    }

    /// Depth-first: purge children, then prune this directory if emptied.
    /// The quarantine root itself is never pruned.
    fn purge_dir(&self, dir: &Path, cutoff: SystemTime, report: &mut PurgeReport) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => {
                report.failures.push(PurgeFailure {
                    path: dir.to_path_buf(),
                    reason: SswError::io(dir, source).to_string(),
                });
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                self.purge_dir(&path, cutoff, report);
                // Fails while the directory still holds fresh entries.
                if fs::remove_dir(&path).is_ok() {
                    report.dirs_pruned += 1;
                }
                continue;
            }
            let older_than_cutoff = meta.modified().is_ok_and(|mtime| mtime < cutoff);
            if !older_than_cutoff {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.files_purged += 1,
                Err(source) => report.failures.push(PurgeFailure {
                    reason: SswError::io(&path, source).to_string(),
                    path,
                }),
            }
        }
    }
}
