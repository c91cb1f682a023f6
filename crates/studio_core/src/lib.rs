//! Entity and link management for agent studio data.
//!
//! Two components share one caller-owned SQLite session:
//! - `EntityStore`: upsert/get/delete for agents, models, skills and workflows.
//! - `LinkRegistry`: link/unlink/query over the fixed set of `LinkKind`s.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::agent::{Agent, AgentConfig, AgentType, HumanInputMode};
pub use model::entity::{Entity, EntityId, EntityKind, EntityValidationError, PlainRecord};
pub use model::link::{LinkKind, LinkedEntities};
pub use model::llm_model::{LlmModel, ModelProvider};
pub use model::skill::Skill;
pub use model::workflow::{SummaryMethod, Workflow, WorkflowType};
pub use repo::entity_repo::{
    EntityRepository, Filters, RepoError, RepoResult, SqliteEntityRepository, UpsertOutcome,
    Upserted,
};
pub use repo::entity_rows::StoredEntity;
pub use repo::link_repo::{LinkOutcome, LinkRepository, SqliteLinkRepository};
pub use service::entity_store::EntityStore;
pub use service::link_registry::LinkRegistry;
pub use service::response::{DbResponse, ErrorKind, LinkOperation, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
