//! Per-type table mapping for persisted entities.
//!
//! # Responsibility
//! - Declare table and data-column names for each entity type.
//! - Convert entities to bind values and rows back to entities.
//!
//! # Invariants
//! - `COLUMNS` excludes `id`, `created_at` and `updated_at`, which every
//!   table shares and the generic repository manages.
//! - `bind_values()` returns exactly one value per entry in `COLUMNS`.
//! - Read paths reject unknown enum text instead of masking it.

use crate::model::agent::{Agent, AgentConfig, AgentType};
use crate::model::entity::{Entity, EntityKind};
use crate::model::llm_model::{LlmModel, ModelProvider};
use crate::model::skill::Skill;
use crate::model::workflow::{SummaryMethod, Workflow, WorkflowType};
use crate::repo::entity_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;

/// Columns every entity table carries, in select order.
pub const SHARED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Storage mapping for one entity type.
pub trait StoredEntity: Entity + Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind_values(&self) -> RepoResult<Vec<Value>>;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// Table backing the given entity kind.
pub fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Agent => Agent::TABLE,
        EntityKind::Model => LlmModel::TABLE,
        EntityKind::Skill => Skill::TABLE,
        EntityKind::Workflow => Workflow::TABLE,
    }
}

/// Data columns of the given entity kind.
pub fn data_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Agent => Agent::COLUMNS,
        EntityKind::Model => LlmModel::COLUMNS,
        EntityKind::Skill => Skill::COLUMNS,
        EntityKind::Workflow => Workflow::COLUMNS,
    }
}

/// Whether `field` names a column of `kind` (shared or data).
pub fn has_column(kind: EntityKind, field: &str) -> bool {
    SHARED_COLUMNS.contains(&field) || data_columns(kind).contains(&field)
}

/// Select list for `E`, optionally qualified with a table alias.
pub(crate) fn select_list<E: StoredEntity>(alias: Option<&str>) -> String {
    SHARED_COLUMNS
        .iter()
        .chain(E::COLUMNS.iter())
        .map(|column| match alias {
            Some(alias) => format!("{alias}.{column} AS {column}"),
            None => (*column).to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl StoredEntity for Agent {
    const TABLE: &'static str = "agents";
    const COLUMNS: &'static [&'static str] = &["user_id", "type", "config"];

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(&self.user_id),
            Value::Text(agent_type_to_db(self.kind).to_string()),
            Value::Text(serde_json::to_string(&self.config)?),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let type_text: String = row.get("type")?;
        let kind = parse_agent_type(&type_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid agent type `{type_text}` in agents.type"))
        })?;
        let config_text: String = row.get("config")?;
        let config: AgentConfig = serde_json::from_str(&config_text).map_err(|err| {
            RepoError::InvalidData(format!("invalid agents.config json: {err}"))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            user_id: row.get("user_id")?,
            kind,
            config,
        })
    }
}

impl StoredEntity for LlmModel {
    const TABLE: &'static str = "models";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "model",
        "api_key",
        "base_url",
        "api_type",
        "api_version",
        "description",
    ];

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(&self.user_id),
            Value::Text(self.model.clone()),
            opt_text(&self.api_key),
            opt_text(&self.base_url),
            Value::Text(provider_to_db(self.api_type).to_string()),
            opt_text(&self.api_version),
            opt_text(&self.description),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let api_type_text: String = row.get("api_type")?;
        let api_type = parse_provider(&api_type_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid api type `{api_type_text}` in models.api_type"
            ))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            user_id: row.get("user_id")?,
            model: row.get("model")?,
            api_key: row.get("api_key")?,
            base_url: row.get("base_url")?,
            api_type,
            api_version: row.get("api_version")?,
            description: row.get("description")?,
        })
    }
}

impl StoredEntity for Skill {
    const TABLE: &'static str = "skills";
    const COLUMNS: &'static [&'static str] =
        &["user_id", "name", "content", "description", "libraries"];

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(&self.user_id),
            Value::Text(self.name.clone()),
            Value::Text(self.content.clone()),
            opt_text(&self.description),
            Value::Text(serde_json::to_string(&self.libraries)?),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let libraries_text: String = row.get("libraries")?;
        let libraries: Vec<String> = serde_json::from_str(&libraries_text).map_err(|err| {
            RepoError::InvalidData(format!("invalid skills.libraries json: {err}"))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            content: row.get("content")?,
            description: row.get("description")?,
            libraries,
        })
    }
}

impl StoredEntity for Workflow {
    const TABLE: &'static str = "workflows";
    const COLUMNS: &'static [&'static str] =
        &["user_id", "name", "description", "type", "summary_method"];

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(&self.user_id),
            Value::Text(self.name.clone()),
            opt_text(&self.description),
            Value::Text(workflow_type_to_db(self.kind).to_string()),
            Value::Text(summary_method_to_db(self.summary_method).to_string()),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let type_text: String = row.get("type")?;
        let kind = parse_workflow_type(&type_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid workflow type `{type_text}` in workflows.type"
            ))
        })?;
        let summary_text: String = row.get("summary_method")?;
        let summary_method = parse_summary_method(&summary_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid summary method `{summary_text}` in workflows.summary_method"
            ))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            kind,
            summary_method,
        })
    }
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

fn agent_type_to_db(kind: AgentType) -> &'static str {
    match kind {
        AgentType::Assistant => "assistant",
        AgentType::Userproxy => "userproxy",
        AgentType::Groupchat => "groupchat",
    }
}

fn parse_agent_type(value: &str) -> Option<AgentType> {
    match value {
        "assistant" => Some(AgentType::Assistant),
        "userproxy" => Some(AgentType::Userproxy),
        "groupchat" => Some(AgentType::Groupchat),
        _ => None,
    }
}

fn provider_to_db(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::Openai => "openai",
        ModelProvider::Google => "google",
        ModelProvider::Azure => "azure",
        ModelProvider::Anthropic => "anthropic",
        ModelProvider::Mistral => "mistral",
        ModelProvider::Together => "together",
        ModelProvider::Groq => "groq",
    }
}

fn parse_provider(value: &str) -> Option<ModelProvider> {
    match value {
        "openai" => Some(ModelProvider::Openai),
        "google" => Some(ModelProvider::Google),
        "azure" => Some(ModelProvider::Azure),
        "anthropic" => Some(ModelProvider::Anthropic),
        "mistral" => Some(ModelProvider::Mistral),
        "together" => Some(ModelProvider::Together),
        "groq" => Some(ModelProvider::Groq),
        _ => None,
    }
}

fn workflow_type_to_db(kind: WorkflowType) -> &'static str {
    match kind {
        WorkflowType::Autonomous => "autonomous",
        WorkflowType::Sequential => "sequential",
    }
}

fn parse_workflow_type(value: &str) -> Option<WorkflowType> {
    match value {
        "autonomous" => Some(WorkflowType::Autonomous),
        "sequential" => Some(WorkflowType::Sequential),
        _ => None,
    }
}

fn summary_method_to_db(method: SummaryMethod) -> &'static str {
    match method {
        SummaryMethod::Last => "last",
        SummaryMethod::None => "none",
        SummaryMethod::Llm => "llm",
    }
}

fn parse_summary_method(value: &str) -> Option<SummaryMethod> {
    match value {
        "last" => Some(SummaryMethod::Last),
        "none" => Some(SummaryMethod::None),
        "llm" => Some(SummaryMethod::Llm),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{has_column, select_list, StoredEntity};
    use crate::model::entity::EntityKind;
    use crate::model::llm_model::{LlmModel, ModelProvider};
    use crate::model::skill::Skill;

    #[test]
    fn bind_values_align_with_columns() {
        let model = LlmModel::new(ModelProvider::Azure, "gpt-4o");
        assert_eq!(model.bind_values().unwrap().len(), LlmModel::COLUMNS.len());

        let skill = Skill::new("fetch_page", "def fetch_page(url): ...");
        assert_eq!(skill.bind_values().unwrap().len(), Skill::COLUMNS.len());
    }

    #[test]
    fn select_list_qualifies_and_aliases_columns() {
        let list = select_list::<Skill>(Some("e"));
        assert!(list.starts_with("e.id AS id, e.created_at AS created_at"));
        assert!(list.ends_with("e.libraries AS libraries"));
    }

    #[test]
    fn has_column_covers_shared_and_data_columns() {
        assert!(has_column(EntityKind::Agent, "id"));
        assert!(has_column(EntityKind::Workflow, "summary_method"));
        assert!(!has_column(EntityKind::Agent, "name"));
        assert!(!has_column(EntityKind::Model, "id; DROP TABLE models"));
    }
}
