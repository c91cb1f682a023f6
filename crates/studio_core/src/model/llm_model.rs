//! LLM model endpoint entity (`EntityKind::Model`).

use crate::model::entity::{require_text, Entity, EntityId, EntityKind, EntityValidationError};
use serde::{Deserialize, Serialize};

/// API flavor spoken by the model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Openai,
    Google,
    Azure,
    Anthropic,
    Mistral,
    Together,
    Groq,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModel {
    pub id: Option<EntityId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: Option<String>,
    /// Provider-side model name, e.g. `gpt-4o`.
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub api_type: ModelProvider,
    pub api_version: Option<String>,
    pub description: Option<String>,
}

impl LlmModel {
    pub fn new(api_type: ModelProvider, model: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: 0,
            updated_at: 0,
            user_id: None,
            model: model.into(),
            api_key: None,
            base_url: None,
            api_type,
            api_version: None,
            description: None,
        }
    }
}

impl Entity for LlmModel {
    const KIND: EntityKind = EntityKind::Model;

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
        require_text(Self::KIND, "model", &self.model)
    }
}
