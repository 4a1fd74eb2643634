//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! The boundary layer (CLI/host integration) loads this once per invocation;
//! the engine only ever sees the immutable snapshot. No component reads
//! ambient process state after `load` returns.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SswError};
use crate::rules::patterns::validate_glob_pattern;

const BYTES_PER_MB: u64 = 1 << 20;

/// Full sweeper configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub rules: RulesConfig,
    pub modes: ModesConfig,
    pub quarantine: QuarantineConfig,
    pub logging: LoggingConfig,
}

/// Detection rules: thresholds, extension lists, and pattern lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    pub remove_files: bool,
    pub remove_directories: bool,
    /// Absolute video threshold in MB. Files below this are samples.
    pub video_size_threshold_mb: u64,
    /// Absolute audio threshold in MB. Zero disables audio size detection.
    pub audio_size_threshold_mb: u64,
    pub video_extensions: Vec<String>,
    pub audio_extensions: Vec<String>,
    /// Name tokens matched on separator boundaries (rule 3).
    pub sample_tokens: Vec<String>,
    /// Always-remove name/path globs (rule 2).
    pub deny_patterns: Vec<String>,
    /// Never-remove name/path globs (rule 1, absolute override).
    pub protected_patterns: Vec<String>,
    pub relative_size_enabled: bool,
    /// Percentage of the largest sibling video (0–100).
    pub relative_size_pct: u8,
    pub image_samples_enabled: bool,
    pub image_extensions: Vec<String>,
    pub junk_extras_enabled: bool,
    pub junk_extra_extensions: Vec<String>,
    /// Per-category threshold overrides keyed by download category.
    #[serde(default)]
    pub category_overrides: HashMap<String, CategoryOverride>,
}

/// Per-category override for size thresholds.
///
/// An override either fully replaces a threshold or is absent; there is no
/// partial fallback within a single threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CategoryOverride {
    pub video_size_threshold_mb: Option<u64>,
    pub audio_size_threshold_mb: Option<u64>,
}

/// Run modes controlling whether and how the filesystem is mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModesConfig {
    /// Simulate only: report intended actions, never mutate.
    pub test_mode: bool,
    /// In test mode, fail the run when samples were found so the host
    /// blocks the import instead of passing junk downstream.
    pub block_import_during_test: bool,
    /// Move matches into the quarantine folder instead of deleting.
    pub quarantine_mode: bool,
}

/// Quarantine aging policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Quarantined items older than this many days are purged.
    /// Zero disables purging.
    pub max_age_days: u64,
}

/// Logging behavior for the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit per-item decision lines in addition to the summary.
    pub verbose: bool,
    /// Optional append-only JSONL decision audit file.
    pub jsonl_log: Option<PathBuf>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            remove_files: true,
            remove_directories: true,
            video_size_threshold_mb: 150,
            audio_size_threshold_mb: 2,
            video_extensions: str_list(&[
                ".mkv", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".ts", ".m4v", ".vob",
            ]),
            audio_extensions: str_list(&[
                ".wav", ".aiff", ".mp3", ".flac", ".m4a", ".ogg", ".aac", ".alac", ".ape",
                ".opus", ".wma",
            ]),
            sample_tokens: vec!["sample".to_string()],
            deny_patterns: Vec::new(),
            protected_patterns: Vec::new(),
            relative_size_enabled: false,
            relative_size_pct: 8,
            image_samples_enabled: false,
            image_extensions: str_list(&[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"]),
            junk_extras_enabled: false,
            junk_extra_extensions: str_list(&[".lnk", ".url", ".webloc"]),
            category_overrides: HashMap::new(),
        }
    }
}

fn str_list(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl RulesConfig {
    /// Effective video threshold in bytes for a category (override or global).
    #[must_use]
    pub fn effective_video_threshold_bytes(&self, category: Option<&str>) -> u64 {
        let mb = category
            .and_then(|c| self.category_overrides.get(c))
            .and_then(|o| o.video_size_threshold_mb)
            .unwrap_or(self.video_size_threshold_mb);
        mb * BYTES_PER_MB
    }

    /// Effective audio threshold in bytes for a category (override or global).
    /// Zero disables audio size detection.
    #[must_use]
    pub fn effective_audio_threshold_bytes(&self, category: Option<&str>) -> u64 {
        let mb = category
            .and_then(|c| self.category_overrides.get(c))
            .and_then(|o| o.audio_size_threshold_mb)
            .unwrap_or(self.audio_size_threshold_mb);
        mb * BYTES_PER_MB
    }
}

impl Config {
    /// Default configuration path (`~/.config/ssw/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("ssw").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SswError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SswError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a config from a TOML string (no env overrides). Used by tests
    /// and embedders that manage their own option sources.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut cfg: Self = toml::from_str(raw)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // rules
        set_env_bool("SSW_RULES_REMOVE_FILES", &mut self.rules.remove_files)?;
        set_env_bool(
            "SSW_RULES_REMOVE_DIRECTORIES",
            &mut self.rules.remove_directories,
        )?;
        set_env_u64(
            "SSW_RULES_VIDEO_SIZE_THRESHOLD_MB",
            &mut self.rules.video_size_threshold_mb,
        )?;
        set_env_u64(
            "SSW_RULES_AUDIO_SIZE_THRESHOLD_MB",
            &mut self.rules.audio_size_threshold_mb,
        )?;
        set_env_list("SSW_RULES_VIDEO_EXTENSIONS", &mut self.rules.video_extensions);
        set_env_list("SSW_RULES_AUDIO_EXTENSIONS", &mut self.rules.audio_extensions);
        set_env_list("SSW_RULES_SAMPLE_TOKENS", &mut self.rules.sample_tokens);
        set_env_list("SSW_RULES_DENY_PATTERNS", &mut self.rules.deny_patterns);
        set_env_list(
            "SSW_RULES_PROTECTED_PATTERNS",
            &mut self.rules.protected_patterns,
        );
        set_env_bool(
            "SSW_RULES_RELATIVE_SIZE_ENABLED",
            &mut self.rules.relative_size_enabled,
        )?;
        set_env_u8("SSW_RULES_RELATIVE_SIZE_PCT", &mut self.rules.relative_size_pct)?;
        set_env_bool(
            "SSW_RULES_IMAGE_SAMPLES_ENABLED",
            &mut self.rules.image_samples_enabled,
        )?;
        set_env_bool(
            "SSW_RULES_JUNK_EXTRAS_ENABLED",
            &mut self.rules.junk_extras_enabled,
        )?;

        // modes
        set_env_bool("SSW_MODES_TEST_MODE", &mut self.modes.test_mode)?;
        set_env_bool(
            "SSW_MODES_BLOCK_IMPORT_DURING_TEST",
            &mut self.modes.block_import_during_test,
        )?;
        set_env_bool("SSW_MODES_QUARANTINE_MODE", &mut self.modes.quarantine_mode)?;

        // quarantine
        set_env_u64(
            "SSW_QUARANTINE_MAX_AGE_DAYS",
            &mut self.quarantine.max_age_days,
        )?;

        // logging
        set_env_bool("SSW_LOGGING_VERBOSE", &mut self.logging.verbose)?;
        if let Some(raw) = env::var_os("SSW_LOGGING_JSONL_LOG") {
            self.logging.jsonl_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    /// Lower-case extensions and force a leading dot, drop empty entries.
    fn normalize(&mut self) {
        for list in [
            &mut self.rules.video_extensions,
            &mut self.rules.audio_extensions,
            &mut self.rules.image_extensions,
            &mut self.rules.junk_extra_extensions,
        ] {
            *list = list
                .iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
                .collect();
        }
        self.rules.sample_tokens = self
            .rules
            .sample_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
    }

    /// Reject configurations that would make the run unsound. Fatal before
    /// any scan; no partial mutation can occur with a bad config.
    pub fn validate(&self) -> Result<()> {
        if self.rules.relative_size_pct > 100 {
            return Err(SswError::InvalidConfig {
                details: format!(
                    "relative_size_pct must be 0-100, got {}",
                    self.rules.relative_size_pct
                ),
            });
        }
        if self.rules.sample_tokens.is_empty() {
            return Err(SswError::InvalidConfig {
                details: "sample_tokens must not be empty".to_string(),
            });
        }
        for pattern in self
            .rules
            .deny_patterns
            .iter()
            .chain(self.rules.protected_patterns.iter())
        {
            validate_glob_pattern(pattern)?;
        }
        Ok(())
    }
}

// ──────────────────── env parsing helpers ────────────────────

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn set_env_bool(name: &str, target: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = parse_env_bool(name, &raw)?;
    }
    Ok(())
}

fn set_env_u64(name: &str, target: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.trim().parse().map_err(|_| SswError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_u8(name: &str, target: &mut u8) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.trim().parse().map_err(|_| SswError::InvalidConfig {
            details: format!("{name} must be 0-255, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_list(name: &str, target: &mut Vec<String>) {
    if let Some(raw) = env_var(name) {
        *target = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        other => Err(SswError::InvalidConfig {
            details: format!("{name} must be a boolean, got {other:?}"),
        }),
    }
}
