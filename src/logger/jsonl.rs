//! JSONL decision audit: append-only line-delimited JSON, one object per
//! classification or action event.
//!
//! Lines are assembled in memory and written atomically via `write_all` so a
//! concurrent tail never sees a partial line. Runs are short-lived and the
//! volume per run is small, so there is no rotation; the degradation chain
//! is file → stderr → silent discard (a logging failure must never fail the
//! remediation run itself).

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SswError};
use crate::rules::engine::{Disposition, RuleId};

/// Event types in the sweep audit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    ItemDecision,
    ItemAction,
    ItemSkipped,
    PurgeComplete,
    RunComplete,
}

/// A single audit line. Only `ts` and `event` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Rule that terminated classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,
    /// Action label: removed, quarantined, simulated, skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            path: None,
            size: None,
            rule: None,
            disposition: None,
            action: None,
            ok: None,
            error_code: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Append-only JSONL audit writer with a two-level fallback.
pub struct AuditWriter {
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

impl AuditWriter {
    /// Open the audit file for appending, creating parent directories.
    /// Falls back to stderr when the file cannot be opened.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        match open_append(path) {
            Ok(file) => Self {
                writer: Some(BufWriter::new(file)),
                state: WriterState::Normal,
            },
            Err(err) => {
                let _ = writeln!(
                    io::stderr(),
                    "[SSW-JSONL] audit file unavailable, using stderr: {err}"
                );
                Self {
                    writer: None,
                    state: WriterState::Stderr,
                }
            }
        }
    }

    /// Write one entry as a single atomic line.
    pub fn write_entry(&mut self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[SSW-JSONL] serialize error: {e}");
                return;
            }
        };
        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.writer = None;
                        self.state = WriterState::Stderr;
                        let _ = write!(io::stderr(), "[SSW-JSONL] {line}");
                    }
                } else {
                    self.state = WriterState::Stderr;
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[SSW-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    /// Flush buffered lines; called once at end of run.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SswError::io(parent, source))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SswError::io(path, source))
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut writer = AuditWriter::open(&path);

        let mut entry = AuditEntry::new(EventType::ItemDecision);
        entry.path = Some("sample.mkv".to_string());
        entry.rule = Some(RuleId::NameToken);
        entry.disposition = Some(Disposition::Remove);
        writer.write_entry(&entry);
        writer.write_entry(&AuditEntry::new(EventType::RunComplete));
        writer.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["event"], "item_decision");
        assert_eq!(parsed["rule"], "name_token");
        assert_eq!(parsed["disposition"], "remove");
    }

    #[test]
    fn none_fields_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.jsonl");
        let mut writer = AuditWriter::open(&path);
        writer.write_entry(&AuditEntry::new(EventType::RunStart));
        writer.flush();

        let line = fs::read_to_string(&path).unwrap();
        assert!(!line.contains("\"path\""));
        assert!(!line.contains("\"rule\""));
        assert!(!line.contains("\"error_code\""));
    }

    #[test]
    fn appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("append.jsonl");
        for _ in 0..2 {
            let mut writer = AuditWriter::open(&path);
            writer.write_entry(&AuditEntry::new(EventType::RunStart));
            writer.flush();
        }
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn unwritable_path_degrades_without_panic() {
        let mut writer = AuditWriter::open(Path::new("/proc/ssw-no-such/audit.jsonl"));
        writer.write_entry(&AuditEntry::new(EventType::RunStart));
        writer.flush();
    }
}
