//! Run outcome model: counters, per-item failures, and the disposition the
//! host maps to its exit status.

use std::path::PathBuf;

use serde::Serialize;

/// Overall outcome of one sweep run.
///
/// `NoAction` means the precondition failed and the tree was never touched
/// (the host marked the download unsuccessful). `Error` means the run could
/// not complete (bad config, unusable root) or test mode found samples while
/// import blocking is on. `PartialError` means the sweep finished but at
/// least one item action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunDisposition {
    NoAction,
    Success,
    Error,
    PartialError,
}

/// One item whose action failed; recorded, never fatal to the run.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub code: String,
    pub reason: String,
}

/// Accumulated result of a sweep run, filled in as the run progresses.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub items_scanned: u64,
    pub files_removed: u64,
    pub dirs_removed: u64,
    pub quarantined: u64,
    pub simulated: u64,
    pub kept_protected: u64,
    pub skipped_by_toggle: u64,
    pub skipped_unsafe: u64,
    pub purged_files: u64,
    pub pruned_dirs: u64,
    pub failures: Vec<ItemFailure>,
    /// Quarantine-aging failures; recorded but never change the disposition.
    pub purge_failures: Vec<ItemFailure>,
    /// Set when test mode found removable items and import blocking is on.
    pub import_blocked: bool,
}

impl RunReport {
    /// Number of items the run acted on (or would have, in test mode).
    #[must_use]
    pub fn actioned(&self) -> u64 {
        self.files_removed + self.dirs_removed + self.quarantined + self.simulated
    }

    /// Final disposition from the accumulated counters.
    #[must_use]
    pub fn disposition(&self) -> RunDisposition {
        if self.import_blocked {
            RunDisposition::Error
        } else if self.failures.is_empty() {
            RunDisposition::Success
        } else {
            RunDisposition::PartialError
        }
    }

    /// One-line human summary for the host log.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "scanned {} items: {} files removed, {} dirs removed, {} quarantined, \
             {} simulated, {} protected, {} failures, {} purged from quarantine",
            self.items_scanned,
            self.files_removed,
            self.dirs_removed,
            self.quarantined,
            self.simulated,
            self.kept_protected,
            self.failures.len(),
            self.purged_files,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_is_success() {
        let report = RunReport::default();
        assert_eq!(report.disposition(), RunDisposition::Success);
        assert_eq!(report.actioned(), 0);
    }

    #[test]
    fn failures_degrade_to_partial() {
        let mut report = RunReport::default();
        report.files_removed = 3;
        report.failures.push(ItemFailure {
            path: PathBuf::from("/dl/sample.mkv"),
            code: "SSW-3002".to_string(),
            reason: "boom".to_string(),
        });
        assert_eq!(report.disposition(), RunDisposition::PartialError);
    }

    #[test]
    fn purge_failures_do_not_change_disposition() {
        let mut report = RunReport::default();
        report.purge_failures.push(ItemFailure {
            path: PathBuf::from("/dl/_samples_quarantine/old.mkv"),
            code: "SSW-3002".to_string(),
            reason: "busy".to_string(),
        });
        assert_eq!(report.disposition(), RunDisposition::Success);
    }

    #[test]
    fn import_block_wins_over_partial() {
        let mut report = RunReport::default();
        report.import_blocked = true;
        report.failures.push(ItemFailure {
            path: PathBuf::from("/dl/x"),
            code: "SSW-3002".to_string(),
            reason: "boom".to_string(),
        });
        assert_eq!(report.disposition(), RunDisposition::Error);
    }

    #[test]
    fn summary_line_mentions_counts() {
        let mut report = RunReport::default();
        report.items_scanned = 7;
        report.files_removed = 2;
        let line = report.summary_line();
        assert!(line.contains("scanned 7 items"));
        assert!(line.contains("2 files removed"));
    }
}
