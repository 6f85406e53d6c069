//! Content rules applied per language.

use catalog_core::types::LanguageId;
use catalog_entity::content::ContentVersion;
use catalog_entity::lifecycle::{ValidationMessages, ValidationRuleKey};

/// Default upper bound for summaries, in characters.
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 150;

/// Required-field and cross-field rules for catalog content.
#[derive(Debug, Clone)]
pub struct ContentRules {
    summary_max_chars: usize,
}

impl ContentRules {
    /// Rules with a custom summary limit.
    pub fn new(summary_max_chars: usize) -> Self {
        Self { summary_max_chars }
    }

    /// Check every language in `languages` and return violated rules.
    pub fn check<I>(&self, version: &ContentVersion, languages: I) -> ValidationMessages
    where
        I: IntoIterator<Item = LanguageId>,
    {
        let mut messages = ValidationMessages::new();
        for language_id in languages {
            self.check_language(version, language_id, &mut messages);
        }
        messages
    }

    fn check_language(
        &self,
        version: &ContentVersion,
        language_id: LanguageId,
        messages: &mut ValidationMessages,
    ) {
        if version.kind.requires_organization() && version.organization_id.is_none() {
            messages.push(language_id, ValidationRuleKey::OrganizationRequired);
        }

        let Some(content) = version.content(language_id) else {
            messages.push(language_id, ValidationRuleKey::NameRequired);
            messages.push(language_id, ValidationRuleKey::SummaryRequired);
            messages.push(language_id, ValidationRuleKey::DescriptionRequired);
            return;
        };

        let name = content.name.trim();
        if name.is_empty() {
            messages.push(language_id, ValidationRuleKey::NameRequired);
        }

        match non_blank(content.summary.as_deref()) {
            None => messages.push(language_id, ValidationRuleKey::SummaryRequired),
            Some(summary) => {
                if !name.is_empty() && summary.eq_ignore_ascii_case(name) {
                    messages.push(language_id, ValidationRuleKey::SummaryEqualsName);
                }
                if summary.chars().count() > self.summary_max_chars {
                    messages.push(language_id, ValidationRuleKey::SummaryTooLong);
                }
            }
        }

        if non_blank(content.description.as_deref()).is_none() {
            messages.push(language_id, ValidationRuleKey::DescriptionRequired);
        }
    }
}

impl Default for ContentRules {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_MAX_CHARS)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
