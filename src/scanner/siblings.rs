//! Video sibling groups for relative-size detection.
//!
//! Video files sharing an immediate parent directory form one group; the
//! group tracks member count and the maximum observed size. The relative-size
//! rule compares each member against that maximum, and a singleton group
//! never triggers a match.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::walker::{CandidateItem, ItemKind};

/// Aggregate over the video files of one parent directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiblingGroup {
    /// Largest video file observed in this directory.
    pub max_size_bytes: u64,
    /// Number of video files in this directory.
    pub members: usize,
}

/// Parent-directory keyed index of video sibling groups.
#[derive(Debug, Default)]
pub struct SiblingIndex {
    groups: HashMap<PathBuf, SiblingGroup>,
}

impl SiblingIndex {
    /// Build the index from the scan pass output.
    #[must_use]
    pub fn build(items: &[CandidateItem], video_extensions: &[String]) -> Self {
        let mut groups: HashMap<PathBuf, SiblingGroup> = HashMap::new();
        for item in items {
            if item.kind != ItemKind::File {
                continue;
            }
            let Some(ext) = &item.extension else {
                continue;
            };
            if !video_extensions.iter().any(|v| v == ext) {
                continue;
            }
            let group = groups.entry(item.parent.clone()).or_default();
            group.members += 1;
            group.max_size_bytes = group.max_size_bytes.max(item.size_bytes);
        }
        Self { groups }
    }

    /// The group for a parent directory, if any video lives there.
    #[must_use]
    pub fn group_for(&self, parent: &Path) -> Option<SiblingGroup> {
        self.groups.get(parent).copied()
    }
}
