//! Publishing status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use catalog_core::AppError;

/// A closed set of codes stored as type rows and resolved through a lookup cache.
pub trait LookupKey: Copy + Eq + std::hash::Hash + Send + Sync + fmt::Debug + 'static {
    /// Every variant, in storage order.
    const ALL: &'static [Self];

    /// The stable code stored in the type table.
    fn code(&self) -> &'static str;

    /// Resolve a stored code back into a variant.
    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }
}

/// Aggregate state of one entity version.
///
/// Derived from the language availabilities of the version; see
/// [`PublishingStatus::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishingStatus {
    /// Never published in any language.
    Draft,
    /// Published in at least one language.
    Published,
    /// A working copy of content that has an earlier published version.
    Modified,
    /// Archived in every language.
    Deleted,
    /// A previously published version superseded by a newer publish.
    OldPublished,
}

impl PublishingStatus {
    /// Derive the aggregate status from per-language statuses.
    ///
    /// Language state is the source of truth. `had_published_predecessor`
    /// distinguishes a fresh draft from a working copy of published content.
    pub fn derive<I>(languages: I, had_published_predecessor: bool) -> Self
    where
        I: IntoIterator<Item = LanguageStatus>,
    {
        let mut any = false;
        let mut all_archived = true;
        for status in languages {
            any = true;
            match status {
                LanguageStatus::Published => return Self::Published,
                LanguageStatus::Archived => {}
                LanguageStatus::Draft => all_archived = false,
            }
        }

        if any && all_archived {
            Self::Deleted
        } else if had_published_predecessor {
            Self::Modified
        } else {
            Self::Draft
        }
    }

    /// Whether a version in this state is visible to the public.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }

    /// Whether a version in this state can still be edited.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Modified | Self::Published)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::OldPublished => "oldpublished",
        }
    }
}

impl LookupKey for PublishingStatus {
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Published,
        Self::Modified,
        Self::Deleted,
        Self::OldPublished,
    ];

    fn code(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for PublishingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PublishingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(&s.to_lowercase()).ok_or_else(|| {
            AppError::validation(format!(
                "Invalid publishing status: '{s}'. Expected one of: draft, published, modified, deleted, oldpublished"
            ))
        })
    }
}

/// Publication state of one language of one entity version.
///
/// Scheduling is not a separate state: a language is scheduled when its
/// availability carries a `publish_at` or `archive_at` instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageStatus {
    /// Being edited, not visible.
    Draft,
    /// Visible to the public.
    Published,
    /// Withdrawn from the public.
    Archived,
}

impl LanguageStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl LookupKey for LanguageStatus {
    const ALL: &'static [Self] = &[Self::Draft, Self::Published, Self::Archived];

    fn code(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for LanguageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(&s.to_lowercase()).ok_or_else(|| {
            AppError::validation(format!(
                "Invalid language status: '{s}'. Expected one of: draft, published, archived"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_publish_is_published() {
        let status = PublishingStatus::derive(
            [LanguageStatus::Published, LanguageStatus::Draft],
            false,
        );
        assert_eq!(status, PublishingStatus::Published);
    }

    #[test]
    fn test_all_archived_is_deleted() {
        let status = PublishingStatus::derive(
            [LanguageStatus::Archived, LanguageStatus::Archived],
            true,
        );
        assert_eq!(status, PublishingStatus::Deleted);
    }

    #[test]
    fn test_working_copy_is_modified() {
        let status = PublishingStatus::derive([LanguageStatus::Draft], true);
        assert_eq!(status, PublishingStatus::Modified);
        let status = PublishingStatus::derive([LanguageStatus::Draft], false);
        assert_eq!(status, PublishingStatus::Draft);
    }

    #[test]
    fn test_no_languages_is_draft() {
        assert_eq!(
            PublishingStatus::derive(std::iter::empty(), false),
            PublishingStatus::Draft
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "OldPublished".parse::<PublishingStatus>().unwrap(),
            PublishingStatus::OldPublished
        );
        assert_eq!(
            "archived".parse::<LanguageStatus>().unwrap(),
            LanguageStatus::Archived
        );
        assert!("scheduled".parse::<LanguageStatus>().is_err());
    }
}
