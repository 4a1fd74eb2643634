//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use sample_sweeper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SswError};

// Scanner
pub use crate::scanner::guard::PathGuard;
pub use crate::scanner::siblings::SiblingIndex;
pub use crate::scanner::walker::{CandidateItem, ScanOutcome, Scanner};

// Rules
pub use crate::rules::engine::{Disposition, RuleEngine, RuleId, Verdict};
pub use crate::rules::patterns::{PatternSet, TokenMatcher};

// Executor
pub use crate::executor::actions::{ActionExecutor, ActionOutcome};
pub use crate::executor::purge::{PurgeReport, QuarantinePurger};

// Run
pub use crate::report::{RunDisposition, RunReport};
pub use crate::runner::{RunOutput, RunRequest, Runner};
