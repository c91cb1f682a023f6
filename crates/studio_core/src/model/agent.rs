//! Agent entity.
//!
//! # Invariants
//! - `config.name` is a non-empty identifier (`[A-Za-z0-9_-]+`).
//! - `config.max_consecutive_auto_reply` stays within the per-type limit.

use crate::model::entity::{Entity, EntityId, EntityKind, EntityValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static AGENT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid agent name regex"));

const AUTO_REPLY_LIMIT: u32 = 30;
const GROUPCHAT_AUTO_REPLY_LIMIT: u32 = 600;
const DEFAULT_AUTO_REPLY: u32 = 10;

/// Agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Assistant,
    Userproxy,
    Groupchat,
}

/// When the agent asks a human for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HumanInputMode {
    Never,
    Terminate,
    Always,
}

/// Behavioral configuration, persisted as one JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub description: Option<String>,
    pub system_message: Option<String>,
    pub human_input_mode: HumanInputMode,
    pub max_consecutive_auto_reply: u32,
    pub default_auto_reply: Option<String>,
}

impl AgentConfig {
    /// Config with the given name and conservative defaults.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            system_message: None,
            human_input_mode: HumanInputMode::Never,
            max_consecutive_auto_reply: DEFAULT_AUTO_REPLY,
            default_auto_reply: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Option<EntityId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: Option<String>,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub config: AgentConfig,
}

impl Agent {
    /// New, unsaved agent. Timestamps are assigned on first upsert.
    pub fn new(kind: AgentType, config: AgentConfig) -> Self {
        Self {
            id: None,
            created_at: 0,
            updated_at: 0,
            user_id: None,
            kind,
            config,
        }
    }

    pub fn name(&self) -> &str {
        self.config.name.as_str()
    }

    fn auto_reply_limit(&self) -> u32 {
        match self.kind {
            AgentType::Groupchat => GROUPCHAT_AUTO_REPLY_LIMIT,
            AgentType::Assistant | AgentType::Userproxy => AUTO_REPLY_LIMIT,
        }
    }
}

impl Entity for Agent {
    const KIND: EntityKind = EntityKind::Agent;

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
        if !AGENT_NAME_RE.is_match(self.name()) {
            return Err(EntityValidationError::InvalidAgentName(
                self.config.name.clone(),
            ));
        }

        let limit = self.auto_reply_limit();
        if self.config.max_consecutive_auto_reply > limit {
            return Err(EntityValidationError::AutoReplyLimitExceeded {
                limit,
                value: self.config.max_consecutive_auto_reply,
            });
        }

        Ok(())
    }
}
