//! Version numbering, chain links, and versioning-mode switches.

use serde::{Deserialize, Serialize};
use std::fmt;

use catalog_core::types::EntityVersionId;

/// `major.minor` number of a version.
///
/// Every new chain link bumps `minor`; every publish bumps `major` and
/// resets `minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionNumber {
    /// Incremented on publish.
    pub major: i32,
    /// Incremented on each saved working copy.
    pub minor: i32,
}

impl VersionNumber {
    /// Number of the first version of a new entity.
    pub const INITIAL: Self = Self { major: 0, minor: 1 };

    /// The number a new working copy of this version receives.
    pub fn next_minor(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    /// The number this version receives when it is published.
    pub fn next_major(&self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
        }
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Position of a version in its chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningInfo {
    /// Version number.
    pub number: VersionNumber,
    /// The version this one was copied from.
    pub predecessor_id: Option<EntityVersionId>,
    /// The version that was copied from this one.
    pub successor_id: Option<EntityVersionId>,
}

impl VersioningInfo {
    /// Whether a newer version supersedes this one.
    pub fn has_successor(&self) -> bool {
        self.successor_id.is_some()
    }
}

/// Opt-in relaxations of the default versioning behavior.
///
/// With no flags set, a save creates a new chain link and resets every
/// language to Draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningMode {
    /// Update the current version in place instead of creating a new link.
    #[serde(default)]
    pub keep_previous_state: bool,
    /// Keep each language's Published/Archived state instead of resetting it.
    #[serde(default)]
    pub keep_language_state: bool,
}

impl VersioningMode {
    /// New chain link, languages reset.
    pub const DEFAULT: Self = Self {
        keep_previous_state: false,
        keep_language_state: false,
    };

    /// In-place update that leaves language state untouched, used by
    /// automated flows such as translation delivery.
    pub const PRESERVE_ALL: Self = Self {
        keep_previous_state: true,
        keep_language_state: true,
    };
}
