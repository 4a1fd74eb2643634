//! The rule engine: an ordered rule list with a single-terminal-match
//! contract.
//!
//! `classify` is a pure function of the candidate, the compiled config
//! snapshot, and the sibling index — no I/O happens here, which keeps every
//! rule unit-testable without touching a disk. Rules evaluate in strict
//! precedence order and the first match wins:
//!
//! 1. Protected pattern → Keep (nothing can undo this)
//! 2. Deny pattern → Remove
//! 3. Sample/junk token in the name → Remove
//! 4. Video size (absolute or relative-to-siblings) → Remove
//! 5. Audio size → Remove
//! 6. Image-sample / junk-extras toggles → Remove
//! 7. No match → Keep

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::rules::patterns::{PatternSet, TokenMatcher};
use crate::scanner::siblings::SiblingIndex;
use crate::scanner::walker::{CandidateItem, ItemKind};

/// Identifier of the rule that produced a verdict, for logging and audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Protected,
    Deny,
    NameToken,
    VideoSize,
    VideoRelativeSize,
    AudioSize,
    ImageSample,
    JunkExtra,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Protected => "protected",
            Self::Deny => "deny",
            Self::NameToken => "name-token",
            Self::VideoSize => "video-size",
            Self::VideoRelativeSize => "video-relative-size",
            Self::AudioSize => "audio-size",
            Self::ImageSample => "image-sample",
            Self::JunkExtra => "junk-extra",
        };
        f.write_str(label)
    }
}

/// Disposition for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Keep,
    Remove,
}

/// Per-item classification result: exactly one disposition, with the rule
/// that terminated evaluation and a human-readable detail for logging.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub disposition: Disposition,
    pub rule: Option<RuleId>,
    pub detail: String,
}

impl Verdict {
    fn keep() -> Self {
        Self {
            disposition: Disposition::Keep,
            rule: None,
            detail: String::new(),
        }
    }

    fn matched(disposition: Disposition, rule: RuleId, detail: String) -> Self {
        Self {
            disposition,
            rule: Some(rule),
            detail,
        }
    }

    /// Whether this verdict is the absolute protected override.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        matches!(self.rule, Some(RuleId::Protected))
    }
}

/// Compiled, per-run snapshot of the detection rules.
///
/// Category overrides are resolved exactly once at construction; an override
/// either fully replaces a threshold or is absent.
#[derive(Debug)]
pub struct RuleEngine {
    protected: PatternSet,
    deny: PatternSet,
    tokens: TokenMatcher,
    lowercase_tokens: Vec<String>,
    video_extensions: Vec<String>,
    audio_extensions: Vec<String>,
    image_extensions: Vec<String>,
    junk_extra_extensions: Vec<String>,
    video_threshold_bytes: u64,
    audio_threshold_bytes: u64,
    relative_size_enabled: bool,
    relative_size_pct: u8,
    image_samples_enabled: bool,
    junk_extras_enabled: bool,
}

impl RuleEngine {
    /// Compile pattern lists and resolve category thresholds for this run.
    pub fn new(config: &Config, category: Option<&str>) -> Result<Self> {
        let rules = &config.rules;
        Ok(Self {
            protected: PatternSet::compile(&rules.protected_patterns)?,
            deny: PatternSet::compile(&rules.deny_patterns)?,
            tokens: TokenMatcher::compile(&rules.sample_tokens)?,
            lowercase_tokens: rules
                .sample_tokens
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            video_extensions: rules.video_extensions.clone(),
            audio_extensions: rules.audio_extensions.clone(),
            image_extensions: rules.image_extensions.clone(),
            junk_extra_extensions: rules.junk_extra_extensions.clone(),
            video_threshold_bytes: rules.effective_video_threshold_bytes(category),
            audio_threshold_bytes: rules.effective_audio_threshold_bytes(category),
            relative_size_enabled: rules.relative_size_enabled,
            relative_size_pct: rules.relative_size_pct,
            image_samples_enabled: rules.image_samples_enabled,
            junk_extras_enabled: rules.junk_extras_enabled,
        })
    }

    /// Video extension list, shared with the sibling grouper.
    #[must_use]
    pub fn video_extensions(&self) -> &[String] {
        &self.video_extensions
    }

    /// Whether a name/relative-path pair matches a protected pattern.
    /// Used directly for the directory bulk-removal veto.
    #[must_use]
    pub fn is_protected(&self, name: &str, rel_path: &Path) -> bool {
        self.protected.matches(name, rel_path)
    }

    /// Evaluate one candidate. First matching rule is terminal.
    #[must_use]
    pub fn classify(&self, item: &CandidateItem, siblings: &SiblingIndex) -> Verdict {
        let name = item.name();

        // 1. Protected: the single override nothing else can undo.
        if let Some(pattern) = self.protected.first_match(&name, &item.rel_path) {
            return Verdict::matched(
                Disposition::Keep,
                RuleId::Protected,
                format!("protected pattern {pattern}"),
            );
        }

        // 2. Deny.
        if let Some(pattern) = self.deny.first_match(&name, &item.rel_path) {
            return Verdict::matched(
                Disposition::Remove,
                RuleId::Deny,
                format!("deny pattern {pattern}"),
            );
        }

        // 3. Sample/junk token on separator boundaries.
        if let Some(token) = self.tokens.first_match(&name) {
            return Verdict::matched(
                Disposition::Remove,
                RuleId::NameToken,
                format!("name token {token:?}"),
            );
        }

        if item.kind == ItemKind::Directory {
            // Size and extension rules are file-only.
            return Verdict::keep();
        }

        let Some(ext) = item.extension.as_deref() else {
            return Verdict::keep();
        };

        // 4. Video size: absolute and relative sub-checks, either sufficient.
        if self.has_ext(&self.video_extensions, ext) {
            if self.video_threshold_bytes > 0 && item.size_bytes < self.video_threshold_bytes {
                return Verdict::matched(
                    Disposition::Remove,
                    RuleId::VideoSize,
                    format!(
                        "{} bytes below video threshold {}",
                        item.size_bytes, self.video_threshold_bytes
                    ),
                );
            }
            if let Some(limit) = self.relative_limit(item, siblings)
                && item.size_bytes < limit
            {
                return Verdict::matched(
                    Disposition::Remove,
                    RuleId::VideoRelativeSize,
                    format!(
                        "{} bytes below {}% of largest sibling video ({} bytes)",
                        item.size_bytes, self.relative_size_pct, limit
                    ),
                );
            }
        }

        // 5. Audio size: zero threshold disables the check entirely.
        if self.has_ext(&self.audio_extensions, ext)
            && self.audio_threshold_bytes > 0
            && item.size_bytes < self.audio_threshold_bytes
        {
            return Verdict::matched(
                Disposition::Remove,
                RuleId::AudioSize,
                format!(
                    "{} bytes below audio threshold {}",
                    item.size_bytes, self.audio_threshold_bytes
                ),
            );
        }

        // 6. Optional toggles: image samples and junk extras.
        if self.image_samples_enabled
            && self.has_ext(&self.image_extensions, ext)
            && self.name_contains_token(&name)
        {
            return Verdict::matched(
                Disposition::Remove,
                RuleId::ImageSample,
                "sample-named image".to_string(),
            );
        }
        if self.junk_extras_enabled && self.has_ext(&self.junk_extra_extensions, ext) {
            return Verdict::matched(
                Disposition::Remove,
                RuleId::JunkExtra,
                format!("junk extra extension {ext}"),
            );
        }

        // 7. No rule matched.
        Verdict::keep()
    }

    fn has_ext(&self, list: &[String], ext: &str) -> bool {
        list.iter().any(|e| e == ext)
    }

    /// Relative-size limit in bytes, or `None` when the check cannot fire:
    /// disabled, no sibling group, or a singleton group (the only video in
    /// its directory is never a relative sample).
    fn relative_limit(&self, item: &CandidateItem, siblings: &SiblingIndex) -> Option<u64> {
        if !self.relative_size_enabled {
            return None;
        }
        let group = siblings.group_for(&item.parent)?;
        if group.members < 2 {
            return None;
        }
        Some(group.max_size_bytes / 100 * u64::from(self.relative_size_pct))
    }

    /// Image-sample naming uses plain substring containment, deliberately
    /// broader than the boundary-aware token rule.
    fn name_contains_token(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.lowercase_tokens.iter().any(|t| lower.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::path::PathBuf;

    const MB: u64 = 1 << 20;

    fn item(name: &str, size: u64) -> CandidateItem {
        let parent = PathBuf::from("/dl");
        CandidateItem {
            path: parent.join(name),
            rel_path: PathBuf::from(name),
            kind: ItemKind::File,
            size_bytes: size,
            extension: crate::core::paths::normalized_extension(Path::new(name)),
            parent,
        }
    }

    fn dir_item(name: &str) -> CandidateItem {
        let parent = PathBuf::from("/dl");
        CandidateItem {
            path: parent.join(name),
            rel_path: PathBuf::from(name),
            kind: ItemKind::Directory,
            size_bytes: 0,
            extension: None,
            parent,
        }
    }

    fn engine(config: &Config) -> RuleEngine {
        RuleEngine::new(config, None).unwrap()
    }

    fn empty_siblings() -> SiblingIndex {
        SiblingIndex::build(&[], &[])
    }

    #[test]
    fn sample_named_video_removed_by_name_before_size() {
        // 90 MB video under a 150 MB threshold, but the name rule wins first.
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("movie.sample.mkv", 90 * MB), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Remove);
        assert_eq!(verdict.rule, Some(RuleId::NameToken));
    }

    #[test]
    fn protected_beats_everything() {
        let mut cfg = Config::default();
        cfg.rules.protected_patterns = vec!["*.srt".to_string()];
        cfg.rules.deny_patterns = vec!["*.srt".to_string()];
        let verdict = engine(&cfg).classify(&item("sample.srt", 10), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
        assert_eq!(verdict.rule, Some(RuleId::Protected));
        assert!(verdict.is_protected());
    }

    #[test]
    fn deny_beats_name_and_size() {
        let mut cfg = Config::default();
        cfg.rules.deny_patterns = vec!["*.nfo".to_string()];
        let verdict = engine(&cfg).classify(&item("release.nfo", 10), &empty_siblings());
        assert_eq!(verdict.rule, Some(RuleId::Deny));
    }

    #[test]
    fn small_video_removed_by_absolute_threshold() {
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("movie.mkv", 90 * MB), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Remove);
        assert_eq!(verdict.rule, Some(RuleId::VideoSize));
    }

    #[test]
    fn large_video_kept() {
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("movie.mkv", 900 * MB), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
        assert!(verdict.rule.is_none());
    }

    #[test]
    fn samplerate_in_title_is_not_a_sample() {
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(
            &item("samplerate.conversion.talk.mkv", 900 * MB),
            &empty_siblings(),
        );
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn relative_size_fires_without_sample_name() {
        // movie.mkv 1.4 GB and an unnamed 40 MB clip in the same folder at
        // 8%: 40 MB < 8% of 1.4 GB (~114 MB).
        let mut cfg = Config::default();
        cfg.rules.relative_size_enabled = true;
        cfg.rules.relative_size_pct = 8;
        cfg.rules.video_size_threshold_mb = 0; // isolate the relative check

        let eng = engine(&cfg);
        let items = vec![item("movie.mkv", 1400 * MB), item("clip.mkv", 40 * MB)];
        let siblings = SiblingIndex::build(&items, eng.video_extensions());

        let verdict = eng.classify(&items[1], &siblings);
        assert_eq!(verdict.disposition, Disposition::Remove);
        assert_eq!(verdict.rule, Some(RuleId::VideoRelativeSize));

        // The feature itself is never a relative sample.
        let verdict = eng.classify(&items[0], &siblings);
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn singleton_group_never_fires_relative() {
        let mut cfg = Config::default();
        cfg.rules.relative_size_enabled = true;
        cfg.rules.video_size_threshold_mb = 0;

        let eng = engine(&cfg);
        let items = vec![item("only.mkv", 40 * MB)];
        let siblings = SiblingIndex::build(&items, eng.video_extensions());

        let verdict = eng.classify(&items[0], &siblings);
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn relative_check_disabled_by_default() {
        let mut cfg = Config::default();
        cfg.rules.video_size_threshold_mb = 0;
        let eng = engine(&cfg);
        let items = vec![item("movie.mkv", 1400 * MB), item("clip.mkv", 40 * MB)];
        let siblings = SiblingIndex::build(&items, eng.video_extensions());
        assert_eq!(
            eng.classify(&items[1], &siblings).disposition,
            Disposition::Keep
        );
    }

    #[test]
    fn small_audio_removed_and_zero_threshold_disables() {
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("preview.mp3", 1 * MB), &empty_siblings());
        assert_eq!(verdict.rule, Some(RuleId::AudioSize));

        let mut cfg = Config::default();
        cfg.rules.audio_size_threshold_mb = 0;
        let verdict = engine(&cfg).classify(&item("preview.mp3", 1 * MB), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn category_override_substitutes_video_threshold() {
        let mut cfg = Config::default();
        cfg.rules.category_overrides.insert(
            "tv".to_string(),
            crate::core::config::CategoryOverride {
                video_size_threshold_mb: Some(50),
                audio_size_threshold_mb: None,
            },
        );
        let eng = RuleEngine::new(&cfg, Some("tv")).unwrap();
        // 90 MB is above the overridden 50 MB threshold: kept.
        let verdict = eng.classify(&item("movie.mkv", 90 * MB), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
        // But 40 MB is below it.
        let verdict = eng.classify(&item("movie2.mkv", 40 * MB), &empty_siblings());
        assert_eq!(verdict.rule, Some(RuleId::VideoSize));
    }

    #[test]
    fn image_sample_requires_toggle_and_substring() {
        let mut cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("sampleshot.jpg", 500_000), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep, "toggle off");

        cfg.rules.image_samples_enabled = true;
        // Substring containment: broader than the boundary token rule.
        let verdict = engine(&cfg).classify(&item("sampleshot.jpg", 500_000), &empty_siblings());
        assert_eq!(verdict.rule, Some(RuleId::ImageSample));

        let verdict = engine(&cfg).classify(&item("cover.jpg", 500_000), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn junk_extras_requires_toggle() {
        let mut cfg = Config::default();
        let verdict = engine(&cfg).classify(&item("visit-us.url", 120), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);

        cfg.rules.junk_extras_enabled = true;
        let verdict = engine(&cfg).classify(&item("visit-us.url", 120), &empty_siblings());
        assert_eq!(verdict.rule, Some(RuleId::JunkExtra));
    }

    #[test]
    fn sample_directory_matches_name_token() {
        let cfg = Config::default();
        let eng = engine(&cfg);
        for name in ["Sample", "Samples", "movie-sample"] {
            let verdict = eng.classify(&dir_item(name), &empty_siblings());
            assert_eq!(verdict.rule, Some(RuleId::NameToken), "{name}");
        }
        let verdict = eng.classify(&dir_item("Subs"), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
    }

    #[test]
    fn directories_never_hit_size_rules() {
        let cfg = Config::default();
        let verdict = engine(&cfg).classify(&dir_item("CD1"), &empty_siblings());
        assert_eq!(verdict.disposition, Disposition::Keep);
        assert!(verdict.rule.is_none());
    }

    #[test]
    fn protected_path_patterns_match_relative_paths() {
        let mut cfg = Config::default();
        cfg.rules.protected_patterns = vec!["subs/**".to_string()];
        let eng = engine(&cfg);
        assert!(eng.is_protected("movie.srt", Path::new("subs/movie.srt")));
        assert!(!eng.is_protected("movie.srt", Path::new("other/movie.srt")));
    }
}
