//! Request models accepted by the lifecycle engine.

use serde::{Deserialize, Serialize};

use catalog_core::types::{EntityVersionId, LanguageId, OrganizationId, UserId};

use super::action::EntityAction;
use crate::content::{EntityKind, LocalizedContent};
use crate::versioning::VersioningMode;

/// Anything that addresses one entity version.
pub trait EntityModel: Send + Sync {
    /// Target version, if the caller supplied one.
    fn entity_id(&self) -> Option<EntityVersionId>;

    /// Whether the caller explicitly asked for validation messages.
    fn include_validation(&self) -> bool {
        false
    }

    /// The target version when present and non-zero.
    fn assigned_id(&self) -> Option<EntityVersionId> {
        EntityVersionId::assigned(self.entity_id())
    }
}

/// A save request.
pub trait SaveModel: EntityModel {
    /// What the save intends.
    fn action(&self) -> EntityAction;
}

/// Request to load one version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEntityModel {
    /// Version to load.
    pub id: Option<EntityVersionId>,
    /// Attach validation messages regardless of publication state.
    #[serde(default)]
    pub include_validation: bool,
}

impl GetEntityModel {
    /// Request for `id` without explicit validation.
    pub fn new(id: EntityVersionId) -> Self {
        Self {
            id: Some(id),
            include_validation: false,
        }
    }

    /// Builder: ask for validation.
    pub fn with_validation(mut self) -> Self {
        self.include_validation = true;
        self
    }
}

impl EntityModel for GetEntityModel {
    fn entity_id(&self) -> Option<EntityVersionId> {
        self.id
    }

    fn include_validation(&self) -> bool {
        self.include_validation
    }
}

/// Save request for catalog content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContentModel {
    /// Version being edited; `None` creates a new root.
    pub id: Option<EntityVersionId>,
    /// Kind of content, used when a new root is created.
    pub kind: EntityKind,
    /// Requested action.
    pub action: EntityAction,
    /// Responsible organization.
    pub organization_id: Option<OrganizationId>,
    /// Texts per language.
    #[serde(default)]
    pub contents: Vec<LocalizedContent>,
    /// Languages to publish when `action` is `SaveAndPublish`; empty means all.
    #[serde(default)]
    pub publish_languages: Vec<LanguageId>,
    /// Versioning relaxations.
    #[serde(default)]
    pub versioning_mode: VersioningMode,
    /// Acting editor.
    pub modified_by: Option<UserId>,
}

impl SaveContentModel {
    /// A new-content save request.
    pub fn new(kind: EntityKind, action: EntityAction) -> Self {
        Self {
            id: None,
            kind,
            action,
            organization_id: None,
            contents: Vec::new(),
            publish_languages: Vec::new(),
            versioning_mode: VersioningMode::DEFAULT,
            modified_by: None,
        }
    }
}

impl EntityModel for SaveContentModel {
    fn entity_id(&self) -> Option<EntityVersionId> {
        self.id
    }
}

impl SaveModel for SaveContentModel {
    fn action(&self) -> EntityAction {
        self.action
    }
}
