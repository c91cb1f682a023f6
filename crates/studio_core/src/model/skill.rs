//! Skill entity: a named code snippet an agent may call.

use crate::model::entity::{require_text, Entity, EntityId, EntityKind, EntityValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Option<EntityId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: Option<String>,
    pub name: String,
    /// Source code of the skill.
    pub content: String,
    pub description: Option<String>,
    /// Packages the skill imports. Persisted as a JSON array.
    pub libraries: Vec<String>,
}

impl Skill {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: 0,
            updated_at: 0,
            user_id: None,
            name: name.into(),
            content: content.into(),
            description: None,
            libraries: Vec::new(),
        }
    }
}

impl Entity for Skill {
    const KIND: EntityKind = EntityKind::Skill;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        require_text(Self::KIND, "name", &self.name)?;
        require_text(Self::KIND, "content", &self.content)
    }
}
