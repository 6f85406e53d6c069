//! Kinds of content items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use catalog_core::AppError;

/// The kind of content a root describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A public service.
    Service,
    /// A service channel (web page, phone, service location, ...).
    Channel,
    /// An organization producing services.
    Organization,
    /// A nationwide general description services may inherit from.
    GeneralDescription,
}

impl EntityKind {
    /// Whether content of this kind must name a responsible organization.
    pub fn requires_organization(&self) -> bool {
        matches!(self, Self::Service | Self::Channel)
    }

    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Channel => "channel",
            Self::Organization => "organization",
            Self::GeneralDescription => "general_description",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "channel" => Ok(Self::Channel),
            "organization" => Ok(Self::Organization),
            "general_description" => Ok(Self::GeneralDescription),
            _ => Err(AppError::validation(format!(
                "Invalid entity kind: '{s}'. Expected one of: service, channel, organization, general_description"
            ))),
        }
    }
}
