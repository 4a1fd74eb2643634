//! Run logging: prefixed host lines on stdout + optional JSONL audit file.

pub mod host;
pub mod jsonl;
