//! Transient validation messages, grouped by language.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use std::fmt;

use catalog_core::types::LanguageId;

/// Content rule that can be violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationRuleKey {
    /// The language has no name.
    NameRequired,
    /// The language has no summary.
    SummaryRequired,
    /// The language has no description.
    DescriptionRequired,
    /// The summary only repeats the name.
    SummaryEqualsName,
    /// The summary exceeds the allowed length.
    SummaryTooLong,
    /// No responsible organization is set.
    OrganizationRequired,
}

impl ValidationRuleKey {
    /// Return the rule key as a camelCase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameRequired => "nameRequired",
            Self::SummaryRequired => "summaryRequired",
            Self::DescriptionRequired => "descriptionRequired",
            Self::SummaryEqualsName => "summaryEqualsName",
            Self::SummaryTooLong => "summaryTooLong",
            Self::OrganizationRequired => "organizationRequired",
        }
    }
}

impl fmt::Display for ValidationRuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unresolved content rule for one language. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Language the violation was found in.
    pub language_id: LanguageId,
    /// The violated rule.
    pub key: ValidationRuleKey,
}

/// Violations keyed by language. Languages without violations are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationMessages(BTreeMap<LanguageId, Vec<ValidationMessage>>);

impl ValidationMessages {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation of `key` in `language_id`.
    pub fn push(&mut self, language_id: LanguageId, key: ValidationRuleKey) {
        let messages = self.0.entry(language_id).or_default();
        if !messages.iter().any(|m| m.key == key) {
            messages.push(ValidationMessage { language_id, key });
        }
    }

    /// Whether no language has a violation.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Languages with at least one violation.
    pub fn languages(&self) -> BTreeSet<LanguageId> {
        self.0
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(language_id, _)| *language_id)
            .collect()
    }

    /// Violations in one language.
    pub fn for_language(&self, language_id: LanguageId) -> &[ValidationMessage] {
        self.0.get(&language_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of violations across languages.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Iterate over languages and their violations.
    pub fn iter(&self) -> impl Iterator<Item = (&LanguageId, &Vec<ValidationMessage>)> {
        self.0.iter()
    }
}

impl FromIterator<ValidationMessage> for ValidationMessages {
    fn from_iter<T: IntoIterator<Item = ValidationMessage>>(iter: T) -> Self {
        let mut messages = Self::new();
        for message in iter {
            messages.push(message.language_id, message.key);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_groups_by_language_and_dedups() {
        let fi = LanguageId::new();
        let sv = LanguageId::new();
        let mut messages = ValidationMessages::new();
        messages.push(fi, ValidationRuleKey::NameRequired);
        messages.push(fi, ValidationRuleKey::NameRequired);
        messages.push(sv, ValidationRuleKey::SummaryRequired);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages.for_language(fi).len(), 1);
        assert_eq!(messages.languages(), BTreeSet::from([fi, sv]));
    }

    #[test]
    fn test_empty() {
        let messages = ValidationMessages::new();
        assert!(messages.is_empty());
        assert!(messages.languages().is_empty());
        assert!(messages.for_language(LanguageId::new()).is_empty());
    }

    #[test]
    fn test_serializes_as_map() {
        let fi = LanguageId::new();
        let mut messages = ValidationMessages::new();
        messages.push(fi, ValidationRuleKey::SummaryTooLong);
        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(
            json[fi.to_string()][0]["key"],
            serde_json::json!("summaryTooLong")
        );
    }
}
