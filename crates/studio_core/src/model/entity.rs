//! Shared entity contract.
//!
//! # Responsibility
//! - Describe what every persisted record exposes to the store.
//! - Provide the plain-map projection used by `as_plain_map` reads.
//!
//! # Invariants
//! - `id` is immutable once assigned by storage.
//! - `updated_at` strictly increases on every update.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned integer identifier.
pub type EntityId = i64;

/// Field-name to value projection of one entity.
pub type PlainRecord = serde_json::Map<String, Value>;

/// The four entity types the store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Model,
    Skill,
    Workflow,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [Self::Agent, Self::Model, Self::Skill, Self::Workflow];

    /// Human-facing type name used in response messages.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Model => "Model",
            Self::Skill => "Skill",
            Self::Workflow => "Workflow",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Contract implemented by every persisted entity type.
pub trait Entity: Serialize {
    const KIND: EntityKind;

    /// `None` until the store assigns an identifier.
    fn id(&self) -> Option<EntityId>;

    /// Creation time in epoch milliseconds.
    fn created_at(&self) -> i64;

    /// Last update time in epoch milliseconds.
    fn updated_at(&self) -> i64;

    /// Checks field-level rules before any write.
    fn validate(&self) -> Result<(), EntityValidationError>;

    /// Projects this entity into a field-name to value map.
    ///
    /// Uses the derived `Serialize` impl, so field names match the serde
    /// names (`type` rather than `kind`).
    fn to_plain_map(&self) -> Result<PlainRecord, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde_json::Error::custom(format!(
                "{} did not serialize to an object: {other}",
                Self::KIND
            ))),
        }
    }
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// Required text field is empty or whitespace.
    BlankField {
        kind: EntityKind,
        field: &'static str,
    },
    /// Agent name contains characters outside `[A-Za-z0-9_-]`.
    InvalidAgentName(String),
    /// Agent auto-reply budget exceeds the limit for its type.
    AutoReplyLimitExceeded { limit: u32, value: u32 },
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { kind, field } => write!(f, "{kind} field `{field}` cannot be blank"),
            Self::InvalidAgentName(name) => write!(
                f,
                "invalid agent name `{name}`: use letters, digits, `_` or `-` without spaces"
            ),
            Self::AutoReplyLimitExceeded { limit, value } => write!(
                f,
                "max_consecutive_auto_reply {value} exceeds limit {limit}"
            ),
        }
    }
}

impl Error for EntityValidationError {}

pub(crate) fn require_text(
    kind: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), EntityValidationError> {
    if value.trim().is_empty() {
        return Err(EntityValidationError::BlankField { kind, field });
    }
    Ok(())
}
