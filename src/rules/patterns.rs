//! Name/path matching primitives: case-insensitive globs and
//! separator-boundary sample tokens.

#![allow(missing_docs)]

use std::path::Path;

use regex::Regex;

use crate::core::errors::{Result, SswError};

/// Compiled glob pattern for name/path matching.
#[derive(Debug, Clone)]
struct GlobPattern {
    original: String,
    compiled: Regex,
}

/// A set of user-declared glob patterns (deny or protected lists).
///
/// Patterns use shell-style globs: `*` matches within a path component,
/// `**` matches across path components, `?` matches a single character.
/// Matching is case-insensitive against both the item's base name and its
/// path relative to the download root.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<GlobPattern>,
}

impl PatternSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pat| {
                let re = glob_to_regex(pat)?;
                Ok(GlobPattern {
                    original: pat.clone(),
                    compiled: re,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    /// Check the base name and the root-relative path against every pattern.
    #[must_use]
    pub fn matches(&self, name: &str, rel_path: &Path) -> bool {
        self.first_match(name, rel_path).is_some()
    }

    /// Return the original pattern text of the first match, for logging.
    #[must_use]
    pub fn first_match(&self, name: &str, rel_path: &Path) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }
        let rel = normalize_for_matching(rel_path);
        self.patterns
            .iter()
            .find(|p| p.compiled.is_match(name) || p.compiled.is_match(&rel))
            .map(|p| p.original.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Separator-boundary matcher for "sample" and scene-junk tokens.
///
/// A token matches only when delimited by `.`, `_`, `-`, whitespace, or the
/// start/end of the name (whole-name equality included). A trailing plural
/// `s` is tolerated so directories named `Samples` match the `sample` token.
/// Mid-token substrings never match: a title containing `samplerate` is safe.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    regexes: Vec<(String, Regex)>,
}

impl TokenMatcher {
    pub fn compile(tokens: &[String]) -> Result<Self> {
        let regexes = tokens
            .iter()
            .map(|token| {
                let escaped = regex::escape(token);
                let pattern = format!(r"(?i)(?:^|[._\-\s]){escaped}s?(?:[._\-\s]|$)");
                Regex::new(&pattern)
                    .map(|re| (token.clone(), re))
                    .map_err(|err| SswError::InvalidConfig {
                        details: format!("invalid sample token {token:?}: {err}"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { regexes })
    }

    /// Return the first token matching `name` on a separator boundary.
    #[must_use]
    pub fn first_match(&self, name: &str) -> Option<&str> {
        self.regexes
            .iter()
            .find(|(_, re)| re.is_match(name))
            .map(|(token, _)| token.as_str())
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.first_match(name).is_some()
    }
}

/// Validate that a glob pattern can be compiled.
pub fn validate_glob_pattern(pattern: &str) -> Result<()> {
    glob_to_regex(pattern).map(|_| ())
}

/// Convert a shell-style glob pattern to a case-insensitive regex.
///
/// Supports:
/// - `**` → matches any path (including separators)
/// - `*`  → matches anything except `/`
/// - `?`  → matches a single character except `/`
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let normalized_pattern = pattern.replace('\\', "/");
    let mut regex_str = String::with_capacity(pattern.len() * 2);
    regex_str.push_str("(?i)^");

    let chars: Vec<char> = normalized_pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                if i + 2 < chars.len() && chars[i + 2] == '/' {
                    regex_str.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    regex_str.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                regex_str.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                regex_str.push_str("[^/]");
                i += 1;
            }
            '.' | '+' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '$' | '|' | '\\' => {
                regex_str.push('\\');
                regex_str.push(chars[i]);
                i += 1;
            }
            c => {
                regex_str.push(c);
                i += 1;
            }
        }
    }

    regex_str.push('$');

    Regex::new(&regex_str).map_err(|err| SswError::InvalidConfig {
        details: format!("invalid glob pattern {pattern:?}: {err}"),
    })
}

fn normalize_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
