//! Request models, result headers, and validation messages exchanged with
//! the lifecycle engine.

pub mod action;
pub mod header;
pub mod model;
pub mod schedule;
pub mod validation;

pub use action::{EntityAction, PublishAction};
pub use header::{EntityHeader, HeaderLanguage};
pub use model::{EntityModel, GetEntityModel, SaveContentModel, SaveModel};
pub use schedule::{PublishingOutcome, PublishingResult, ScheduleLanguage, ScheduleModel};
pub use validation::{ValidationMessage, ValidationMessages, ValidationRuleKey};
