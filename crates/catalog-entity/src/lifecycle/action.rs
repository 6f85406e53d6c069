//! Save and publish actions requested by callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a save request intends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityAction {
    /// Persist only.
    Save,
    /// Persist and report validation messages.
    SaveAndValidate,
    /// Persist, then publish. Locks existing entities.
    SaveAndPublish,
}

impl EntityAction {
    /// Every action other than a plain save asks for validation.
    pub fn includes_validation(&self) -> bool {
        !matches!(self, Self::Save)
    }

    /// Return the action as a camelCase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::SaveAndValidate => "saveAndValidate",
            Self::SaveAndPublish => "saveAndPublish",
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which instant a schedule request records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublishAction {
    /// Record `publish_at` on the requested languages.
    SchedulePublish,
    /// Record `archive_at` on the requested languages.
    ScheduleArchive,
}

impl PublishAction {
    /// Return the action as a camelCase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchedulePublish => "schedulePublish",
            Self::ScheduleArchive => "scheduleArchive",
        }
    }
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
