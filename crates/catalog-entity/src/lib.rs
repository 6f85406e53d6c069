//! # catalog-entity
//!
//! Domain entity models for the service catalog. A content item (service,
//! channel, organization, general description) has one [`ContentRoot`] and
//! a chain of [`ContentVersion`]s, each carrying one
//! [`ContentLanguageAvailability`] per language. Language availability is
//! the unit of publication; the version's [`PublishingStatus`] is a derived
//! summary.
//!
//! The lifecycle engine is generic over the [`RootEntity`],
//! [`VersionedEntity`], and [`LanguageAvailability`] traits; the concrete
//! content types here are the catalog's implementation of that triple.

pub mod content;
pub mod lifecycle;
pub mod status;
pub mod traits;
pub mod versioning;

pub use content::{
    ContentLanguageAvailability, ContentRoot, ContentVersion, EntityKind, LocalizedContent,
};
pub use lifecycle::{
    EntityAction, EntityHeader, EntityModel, GetEntityModel, HeaderLanguage, PublishAction,
    PublishingOutcome, PublishingResult, SaveContentModel, SaveModel, ScheduleLanguage,
    ScheduleModel, ValidationMessage, ValidationMessages, ValidationRuleKey,
};
pub use status::{LanguageStatus, LookupKey, PublishingStatus};
pub use traits::{LanguageAvailability, RootEntity, VersionedEntity};
pub use versioning::{VersionNumber, VersioningInfo, VersioningMode};
