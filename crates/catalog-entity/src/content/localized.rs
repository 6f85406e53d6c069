//! Language-specific text of a content version.

use serde::{Deserialize, Serialize};

use catalog_core::types::LanguageId;

/// The texts of one version in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedContent {
    /// Language of the texts.
    pub language_id: LanguageId,
    /// Display name.
    pub name: String,
    /// Optional alternate name.
    pub alternate_name: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Full description.
    pub description: Option<String>,
}

impl LocalizedContent {
    /// Create content with only a name.
    pub fn named(language_id: LanguageId, name: impl Into<String>) -> Self {
        Self {
            language_id,
            name: name.into(),
            alternate_name: None,
            summary: None,
            description: None,
        }
    }

    /// Builder: set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
