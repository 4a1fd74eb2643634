//! Classification rules: compiled patterns and the precedence engine.

pub mod engine;
pub mod patterns;
