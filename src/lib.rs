#![forbid(unsafe_code)]

//! sample_sweeper (ssw) — classifies completed download trees and removes
//! disposable sample/junk content before library import.
//!
//! The pipeline: a path guard confines all access to the download root, a
//! sequential scanner collects candidates, an ordered rule engine produces
//! one verdict per item, and the executor deletes, quarantines, or simulates
//! per the configured mode. A retention pass ages old items out of the
//! quarantine folder.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use sample_sweeper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use sample_sweeper::core::config::Config;
//! use sample_sweeper::runner::{RunRequest, Runner};
//! ```

pub mod prelude;

pub mod core;
pub mod executor;
pub mod logger;
pub mod report;
pub mod rules;
pub mod runner;
pub mod scanner;
