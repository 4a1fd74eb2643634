//! Host-facing log lines.
//!
//! Download automation hosts capture the process's stdout and route each
//! line by its bracketed prefix, so every line goes through one of the
//! prefixed writers here. `detail` lines are per-item decisions and only
//! appear in verbose mode; `info`, `warn`, and `error` always print.

use std::io::{self, Write};

/// Severity prefixes recognized by the host's output parser.
const INFO: &str = "[INFO]";
const WARNING: &str = "[WARNING]";
const ERROR: &str = "[ERROR]";
const DETAIL: &str = "[DETAIL]";

/// Prefixed stdout logger for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunLogger {
    verbose: bool,
}

impl RunLogger {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn info(&self, msg: &str) {
        emit(INFO, msg);
    }

    pub fn warn(&self, msg: &str) {
        emit(WARNING, msg);
    }

    pub fn error(&self, msg: &str) {
        emit(ERROR, msg);
    }

    /// Per-item decision line; suppressed unless verbose is on.
    pub fn detail(&self, msg: &str) {
        if self.verbose {
            emit(DETAIL, msg);
        }
    }
}

fn emit(prefix: &str, msg: &str) {
    // A broken stdout pipe must not abort the run mid-mutation.
    let _ = writeln!(io::stdout(), "{prefix} {msg}");
}
