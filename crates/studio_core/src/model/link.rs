//! Relationship kinds between entities.
//!
//! # Responsibility
//! - Define the closed set of link kinds and their endpoint entity types.
//! - Parse caller-supplied kind tags.
//!
//! # Invariants
//! - Every kind has exactly one primary and one secondary entity type.
//! - `AgentAgent` is directed (parent -> child). For the other kinds the
//!   primary and secondary types differ, so direction is implied.

use crate::model::agent::Agent;
use crate::model::entity::{Entity, EntityId, EntityKind, PlainRecord};
use crate::model::llm_model::LlmModel;
use crate::model::skill::Skill;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Relationship kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Agent uses a model endpoint.
    AgentModel,
    /// Agent may call a skill.
    AgentSkill,
    /// Agent (parent, e.g. a group chat manager) owns a child agent.
    AgentAgent,
    /// Workflow runs an agent.
    WorkflowAgent,
}

impl LinkKind {
    pub const ALL: [LinkKind; 4] = [
        Self::AgentModel,
        Self::AgentSkill,
        Self::AgentAgent,
        Self::WorkflowAgent,
    ];

    /// Canonical tag, e.g. `agent_model`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgentModel => "agent_model",
            Self::AgentSkill => "agent_skill",
            Self::AgentAgent => "agent_agent",
            Self::WorkflowAgent => "workflow_agent",
        }
    }

    /// Parses a kind tag. Accepts `agent_model` and `agent-model` spellings,
    /// case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Entity type on the owning side of the link.
    pub fn primary(self) -> EntityKind {
        match self {
            Self::AgentModel | Self::AgentSkill | Self::AgentAgent => EntityKind::Agent,
            Self::WorkflowAgent => EntityKind::Workflow,
        }
    }

    /// Entity type collected under the primary.
    pub fn secondary(self) -> EntityKind {
        match self {
            Self::AgentModel => EntityKind::Model,
            Self::AgentSkill => EntityKind::Skill,
            Self::AgentAgent | Self::WorkflowAgent => EntityKind::Agent,
        }
    }

    /// Whether `(a, b)` and `(b, a)` are different links of the same type pair.
    pub fn is_directional(self) -> bool {
        matches!(self, Self::AgentAgent)
    }

    /// Comma-separated list of accepted tags, for error messages.
    pub fn valid_tags() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection of secondaries linked to one primary.
///
/// The typed variant is fixed by the link kind: `AgentModel` yields
/// `Models`, `AgentSkill` yields `Skills`, `AgentAgent` and `WorkflowAgent`
/// yield `Agents`. `Records` carries the plain-map projection of any of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LinkedEntities {
    Models(Vec<LlmModel>),
    Skills(Vec<Skill>),
    Agents(Vec<Agent>),
    Records(Vec<PlainRecord>),
}

impl Default for LinkedEntities {
    fn default() -> Self {
        Self::Records(Vec::new())
    }
}

impl LinkedEntities {
    pub fn len(&self) -> usize {
        match self {
            Self::Models(items) => items.len(),
            Self::Skills(items) => items.len(),
            Self::Agents(items) => items.len(),
            Self::Records(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of the linked entities, in link order.
    pub fn ids(&self) -> Vec<EntityId> {
        match self {
            Self::Models(items) => items.iter().filter_map(Entity::id).collect(),
            Self::Skills(items) => items.iter().filter_map(Entity::id).collect(),
            Self::Agents(items) => items.iter().filter_map(Entity::id).collect(),
            Self::Records(items) => items
                .iter()
                .filter_map(|record| record.get("id").and_then(|id| id.as_i64()))
                .collect(),
        }
    }

    /// Converts typed collections into plain maps; `Records` passes through.
    pub fn into_records(self) -> Result<Vec<PlainRecord>, serde_json::Error> {
        match self {
            Self::Models(items) => items.iter().map(Entity::to_plain_map).collect(),
            Self::Skills(items) => items.iter().map(Entity::to_plain_map).collect(),
            Self::Agents(items) => items.iter().map(Entity::to_plain_map).collect(),
            Self::Records(items) => Ok(items),
        }
    }
}
