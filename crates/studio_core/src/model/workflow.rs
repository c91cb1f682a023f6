//! Workflow entity: an ordered or autonomous arrangement of agents.

use crate::model::entity::{require_text, Entity, EntityId, EntityKind, EntityValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    Autonomous,
    Sequential,
}

/// How a finished conversation is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMethod {
    Last,
    None,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Option<EntityId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: WorkflowType,
    pub summary_method: SummaryMethod,
}

impl Workflow {
    pub fn new(name: impl Into<String>, kind: WorkflowType) -> Self {
        Self {
            id: None,
            created_at: 0,
            updated_at: 0,
            user_id: None,
            name: name.into(),
            description: None,
            kind,
            summary_method: SummaryMethod::Last,
        }
    }
}

impl Entity for Workflow {
    const KIND: EntityKind = EntityKind::Workflow;

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
        require_text(Self::KIND, "name", &self.name)
    }
}
