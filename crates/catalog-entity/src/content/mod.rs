//! Concrete content entities of the catalog.

pub mod kind;
pub mod language;
pub mod localized;
pub mod root;
pub mod version;

pub use kind::EntityKind;
pub use language::ContentLanguageAvailability;
pub use localized::LocalizedContent;
pub use root::ContentRoot;
pub use version::ContentVersion;
