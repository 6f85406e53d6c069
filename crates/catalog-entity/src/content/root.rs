//! Content root entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::types::EntityRootId;

use super::kind::EntityKind;
use crate::traits::RootEntity;

/// The stable identity of a content item. Never deleted while a version exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRoot {
    /// Root identifier.
    pub id: EntityRootId,
    /// What the item is.
    pub kind: EntityKind,
    /// When the root was created.
    pub created_at: DateTime<Utc>,
}

impl ContentRoot {
    /// Create a new root of the given kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: EntityRootId::new(),
            kind,
            created_at: Utc::now(),
        }
    }
}

impl RootEntity for ContentRoot {
    fn id(&self) -> EntityRootId {
        self.id
    }
}
