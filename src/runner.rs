//! Run orchestration: precondition, scan, classify, act, purge, report.
//!
//! The run is a strict pipeline. Classification completes for the whole tree
//! before any action executes, which is what makes the directory veto sound:
//! a directory slated for bulk removal is re-checked against the protected
//! status of everything scanned beneath it before anything is deleted.

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::executor::actions::{ActionExecutor, ActionOutcome};
use crate::executor::purge::QuarantinePurger;
use crate::logger::host::RunLogger;
use crate::logger::jsonl::{AuditEntry, AuditWriter, EventType};
use crate::report::{ItemFailure, RunDisposition, RunReport};
use crate::rules::engine::{Disposition, RuleEngine, RuleId, Verdict};
use crate::scanner::guard::PathGuard;
use crate::scanner::siblings::SiblingIndex;
use crate::scanner::walker::{CandidateItem, Scanner};

/// One sweep invocation as handed over by the host integration.
#[derive(Debug)]
pub struct RunRequest<'a> {
    /// Completed download directory to sweep.
    pub root: &'a Path,
    /// Host download category, selects threshold overrides.
    pub category: Option<&'a str>,
    /// Whether the host considers the download itself successful. A failed
    /// download is never swept.
    pub overall_success: bool,
}

/// Final result handed back to the boundary layer.
#[derive(Debug)]
pub struct RunOutput {
    pub disposition: RunDisposition,
    pub report: RunReport,
}

/// Executes sweep runs against a fixed configuration.
pub struct Runner<'a> {
    config: &'a Config,
    log: RunLogger,
}

impl<'a> Runner<'a> {
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self {
            config,
            log: RunLogger::new(config.logging.verbose),
        }
    }

    /// Execute one run. Fatal setup errors (bad config, unusable root)
    /// return `Err`; everything after scanning degrades per item instead.
    pub fn execute(&self, request: &RunRequest<'_>) -> Result<RunOutput> {
        if !request.overall_success {
            self.log
                .info("download not marked successful, skipping sweep");
            return Ok(RunOutput {
                disposition: RunDisposition::NoAction,
                report: RunReport::default(),
            });
        }

        let mut audit = self
            .config
            .logging
            .jsonl_log
            .as_deref()
            .map(AuditWriter::open);
        if let Some(a) = audit.as_mut() {
            let mut entry = AuditEntry::new(EventType::RunStart);
            entry.path = Some(request.root.display().to_string());
            a.write_entry(&entry);
        }

        let guard = PathGuard::new(request.root)?;
        let engine = RuleEngine::new(self.config, request.category)?;

        let outcome = Scanner::new(&guard).scan()?;
        let mut report = RunReport::default();
        report.items_scanned = outcome.items.len() as u64;
        report.skipped_unsafe = outcome.skipped_unsafe.len() as u64;
        for skipped in &outcome.skipped_unsafe {
            self.log
                .warn(&format!("[{}] {}", skipped.code, skipped.reason));
            if let Some(a) = audit.as_mut() {
                let mut entry = AuditEntry::new(EventType::ItemSkipped);
                entry.path = Some(skipped.path.display().to_string());
                entry.error_code = Some(skipped.code.clone());
                entry.details = Some(skipped.reason.clone());
                a.write_entry(&entry);
            }
        }

        let siblings = SiblingIndex::build(&outcome.items, engine.video_extensions());
        let mut verdicts: Vec<Verdict> = outcome
            .items
            .iter()
            .map(|item| engine.classify(item, &siblings))
            .collect();

        self.apply_directory_veto(&outcome.items, &mut verdicts);
        self.act(&outcome.items, &verdicts, request.root, &mut report, audit.as_mut());

        if !self.config.modes.test_mode {
            self.purge_quarantine(request.root, &mut report, audit.as_mut());
        }

        // Removal toggles only suppress the action, not the finding, so
        // toggle-skipped matches still block the import.
        let found_removable = report.simulated + report.skipped_by_toggle;
        if self.config.modes.test_mode
            && self.config.modes.block_import_during_test
            && found_removable > 0
        {
            report.import_blocked = true;
            self.log.error(&format!(
                "test mode found {found_removable} removable item(s), blocking import"
            ));
        }

        self.log.info(&report.summary_line());
        let disposition = report.disposition();
        if let Some(a) = audit.as_mut() {
            let mut entry = AuditEntry::new(EventType::RunComplete);
            entry.ok = Some(disposition == RunDisposition::Success);
            entry.details = Some(report.summary_line());
            a.write_entry(&entry);
            a.flush();
        }
        Ok(RunOutput {
            disposition,
            report,
        })
    }

    /// A Remove verdict on a directory is vetoed when anything scanned
    /// beneath it is protected. The veto converts the verdict to a
    /// protected Keep so the action pass reports it as such.
    fn apply_directory_veto(&self, items: &[CandidateItem], verdicts: &mut [Verdict]) {
        let protected_paths: Vec<&PathBuf> = items
            .iter()
            .zip(verdicts.iter())
            .filter(|(_, v)| v.is_protected())
            .map(|(i, _)| &i.path)
            .collect();
        if protected_paths.is_empty() {
            return;
        }
        for (idx, item) in items.iter().enumerate() {
            if !item.is_dir() || verdicts[idx].disposition != Disposition::Remove {
                continue;
            }
            let shields = protected_paths
                .iter()
                .any(|p| p.starts_with(&item.path) && p.as_path() != item.path);
            if shields {
                self.log.warn(&format!(
                    "not removing {}: protected content inside",
                    item.rel_path.display()
                ));
                verdicts[idx] = Verdict {
                    disposition: Disposition::Keep,
                    rule: Some(RuleId::Protected),
                    detail: "protected descendant".to_string(),
                };
            }
        }
    }

    /// Action pass over the sorted item list. Items covered by an already
    /// removed (or simulated-removed) ancestor directory are skipped; the
    /// ancestor action accounts for them.
    fn act(
        &self,
        items: &[CandidateItem],
        verdicts: &[Verdict],
        root: &Path,
        report: &mut RunReport,
        mut audit: Option<&mut AuditWriter>,
    ) {
        let executor = ActionExecutor::new(self.config, root);
        let mut covered: Vec<PathBuf> = Vec::new();

        for (item, verdict) in items.iter().zip(verdicts.iter()) {
            if covered.iter().any(|prefix| item.path.starts_with(prefix)) {
                continue;
            }

            if let Some(a) = audit.as_deref_mut()
                && verdict.rule.is_some()
            {
                let mut entry = AuditEntry::new(EventType::ItemDecision);
                entry.path = Some(item.rel_path.display().to_string());
                entry.size = (!item.is_dir()).then_some(item.size_bytes);
                entry.rule = verdict.rule;
                entry.disposition = Some(verdict.disposition);
                entry.details = Some(verdict.detail.clone());
                a.write_entry(&entry);
            }

            match verdict.disposition {
                Disposition::Keep => {
                    if verdict.is_protected() {
                        report.kept_protected += 1;
                        self.log.detail(&format!(
                            "keeping {} ({})",
                            item.rel_path.display(),
                            verdict.detail
                        ));
                    }
                }
                Disposition::Remove => {
                    let outcome = executor.apply(item);
                    self.record_action(item, verdict, &outcome, report, audit.as_deref_mut());
                    let descendants_gone = item.is_dir()
                        && matches!(
                            outcome,
                            ActionOutcome::Simulated
                                | ActionOutcome::RemovedDirectory
                                | ActionOutcome::Quarantined { .. }
                        );
                    if descendants_gone {
                        covered.push(item.path.clone());
                    }
                }
            }
        }
    }

    fn record_action(
        &self,
        item: &CandidateItem,
        verdict: &Verdict,
        outcome: &ActionOutcome,
        report: &mut RunReport,
        audit: Option<&mut AuditWriter>,
    ) {
        let rel = item.rel_path.display();
        let action_label = match outcome {
            ActionOutcome::Simulated => {
                report.simulated += 1;
                self.log
                    .info(&format!("would remove {rel} ({})", verdict.detail));
                "simulated"
            }
            ActionOutcome::RemovedFile => {
                report.files_removed += 1;
                self.log
                    .info(&format!("removed file {rel} ({})", verdict.detail));
                "removed"
            }
            ActionOutcome::RemovedDirectory => {
                report.dirs_removed += 1;
                self.log
                    .info(&format!("removed directory {rel} ({})", verdict.detail));
                "removed"
            }
            ActionOutcome::Quarantined { dest } => {
                report.quarantined += 1;
                self.log
                    .info(&format!("quarantined {rel} -> {}", dest.display()));
                "quarantined"
            }
            ActionOutcome::SkippedByToggle => {
                report.skipped_by_toggle += 1;
                self.log
                    .detail(&format!("matched {rel} but removal is disabled"));
                "skipped"
            }
            ActionOutcome::Failed { code, reason } => {
                self.log.error(&format!("[{code}] {reason}"));
                report.failures.push(ItemFailure {
                    path: item.path.clone(),
                    code: code.clone(),
                    reason: reason.clone(),
                });
                "failed"
            }
        };
        if let Some(a) = audit {
            let mut entry = AuditEntry::new(EventType::ItemAction);
            entry.path = Some(item.rel_path.display().to_string());
            entry.action = Some(action_label.to_string());
            entry.ok = Some(!outcome.is_failure());
            if let ActionOutcome::Failed { code, .. } = outcome {
                entry.error_code = Some(code.clone());
            }
            a.write_entry(&entry);
        }
    }

    fn purge_quarantine(
        &self,
        root: &Path,
        report: &mut RunReport,
        audit: Option<&mut AuditWriter>,
    ) {
        let purger = QuarantinePurger::new(root, self.config.quarantine.max_age_days);
        let purge = purger.purge();
        report.purged_files = purge.files_purged;
        report.pruned_dirs = purge.dirs_pruned;
        for failure in purge.failures {
            self.log.warn(&failure.reason);
            report.purge_failures.push(ItemFailure {
                path: failure.path,
                code: "SSW-3002".to_string(),
                reason: failure.reason,
            });
        }
        if purge.files_purged > 0 {
            self.log.info(&format!(
                "purged {} aged item(s) from quarantine",
                purge.files_purged
            ));
        }
        if let Some(a) = audit
            && report.purged_files + report.pruned_dirs > 0
        {
            let mut entry = AuditEntry::new(EventType::PurgeComplete);
            entry.details = Some(format!(
                "{} files purged, {} dirs pruned",
                report.purged_files, report.pruned_dirs
            ));
            a.write_entry(&entry);
        }
    }
}
