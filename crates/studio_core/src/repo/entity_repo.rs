//! Entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide generic upsert/find/delete over every entity table.
//! - Expose id-scoped existence checks used by the link repository.
//!
//! # Invariants
//! - Write paths call `Entity::validate()` before any SQL mutation.
//! - Upsert never changes `id` or `created_at` of an existing row.
//! - `updated_at` on update is `max(now, previous + 1)`, so it strictly
//!   increases even when two writes land in the same millisecond.
//! - Filter fields are checked against the table's declared columns before
//!   they reach SQL.

use crate::db::DbError;
use crate::model::agent::Agent;
use crate::model::entity::{EntityId, EntityKind, EntityValidationError, PlainRecord};
use crate::model::llm_model::LlmModel;
use crate::model::skill::Skill;
use crate::model::workflow::Workflow;
use crate::repo::entity_rows::{has_column, select_list, table_name, StoredEntity};
use crate::repo::{ensure_tables, now_epoch_ms};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity and link persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntityValidationError),
    Db(DbError),
    /// Filter names a field the entity table does not have.
    UnknownField {
        kind: EntityKind,
        field: String,
    },
    /// Connection is missing a table this repository depends on.
    MissingRequiredTable(&'static str),
    InvalidData(String),
    /// JSON column could not be encoded or decoded.
    Encoding(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownField { kind, field } => {
                write!(f, "{kind} has no field `{field}`")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Encoding(err) => write!(f, "json encoding failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::UnknownField { .. } | Self::MissingRequiredTable(_) | Self::InvalidData(_) => {
                None
            }
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// Conjunctive exact-match filters.
///
/// An empty filter set matches every row of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    conditions: Vec<(String, Value)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching exactly one identifier.
    pub fn by_id(id: EntityId) -> Self {
        Self::new().eq("id", id)
    }

    /// Adds a `field = value` condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Field names only; values may carry secrets and are never logged.
    pub fn describe_fields(&self) -> String {
        if self.conditions.is_empty() {
            return "*".to_string();
        }
        self.conditions
            .iter()
            .map(|(field, _)| field.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn where_clause(&self, kind: EntityKind) -> RepoResult<(String, Vec<Value>)> {
        if self.conditions.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::with_capacity(self.conditions.len());
        for (field, value) in &self.conditions {
            if !has_column(kind, field) {
                return Err(RepoError::UnknownField {
                    kind,
                    field: field.clone(),
                });
            }
            clauses.push(format!("{field} = ?"));
            values.push(value.clone());
        }

        Ok((format!(" WHERE {}", clauses.join(" AND ")), values))
    }
}

/// Whether an upsert inserted or overwrote a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Stored entity as read back after an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<E> {
    pub entity: E,
    pub outcome: UpsertOutcome,
}

/// Repository interface for generic entity persistence.
pub trait EntityRepository {
    /// Inserts or overwrites by identifier, returning the stored row.
    fn upsert<E: StoredEntity>(&self, entity: &E) -> RepoResult<Upserted<E>>;
    /// Lists rows matching all filters, in storage order.
    fn find<E: StoredEntity>(&self, filters: &Filters) -> RepoResult<Vec<E>>;
    /// Lists rows matching all filters as plain field maps.
    fn find_records(&self, kind: EntityKind, filters: &Filters) -> RepoResult<Vec<PlainRecord>>;
    /// Deletes rows matching all filters and returns how many were removed.
    fn delete(&self, kind: EntityKind, filters: &Filters) -> RepoResult<usize>;
}

/// SQLite-backed entity repository.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &EntityKind::ALL.map(table_name))?;
        Ok(Self { conn })
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn upsert<E: StoredEntity>(&self, entity: &E) -> RepoResult<Upserted<E>> {
        entity.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (id, outcome) = write_entity(&tx, entity, now_epoch_ms())?;
        let stored = find_by_id::<E>(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("{} {id} missing after upsert", E::KIND))
        })?;
        tx.commit()?;

        Ok(Upserted {
            entity: stored,
            outcome,
        })
    }

    fn find<E: StoredEntity>(&self, filters: &Filters) -> RepoResult<Vec<E>> {
        find_where(self.conn, filters)
    }

    fn find_records(&self, kind: EntityKind, filters: &Filters) -> RepoResult<Vec<PlainRecord>> {
        match kind {
            EntityKind::Agent => to_records(find_where::<Agent>(self.conn, filters)?),
            EntityKind::Model => to_records(find_where::<LlmModel>(self.conn, filters)?),
            EntityKind::Skill => to_records(find_where::<Skill>(self.conn, filters)?),
            EntityKind::Workflow => to_records(find_where::<Workflow>(self.conn, filters)?),
        }
    }

    fn delete(&self, kind: EntityKind, filters: &Filters) -> RepoResult<usize> {
        let (where_sql, values) = filters.where_clause(kind)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            &format!("DELETE FROM {}{where_sql};", table_name(kind)),
            params_from_iter(values),
        )?;
        tx.commit()?;
        Ok(removed)
    }
}

/// Loads one entity by identifier.
pub(crate) fn find_by_id<E: StoredEntity>(
    conn: &Connection,
    id: EntityId,
) -> RepoResult<Option<E>> {
    Ok(find_where::<E>(conn, &Filters::by_id(id))?.into_iter().next())
}

/// Checks whether a row with `id` exists in the table of `kind`.
pub(crate) fn entity_exists(conn: &Connection, kind: EntityKind, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            table_name(kind)
        ),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn to_records<E: StoredEntity>(entities: Vec<E>) -> RepoResult<Vec<PlainRecord>> {
    entities
        .iter()
        .map(|entity| entity.to_plain_map().map_err(RepoError::from))
        .collect()
}

fn find_where<E: StoredEntity>(conn: &Connection, filters: &Filters) -> RepoResult<Vec<E>> {
    let (where_sql, values) = filters.where_clause(E::KIND)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {}{where_sql};",
        select_list::<E>(None),
        E::TABLE
    ))?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(E::from_row(row)?);
    }
    Ok(entities)
}

fn write_entity<E: StoredEntity>(
    conn: &Connection,
    entity: &E,
    now: i64,
) -> RepoResult<(EntityId, UpsertOutcome)> {
    let mut values = entity.bind_values()?;

    if let Some(id) = entity.id() {
        if entity_exists(conn, E::KIND, id)? {
            let assignments = E::COLUMNS
                .iter()
                .enumerate()
                .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let now_idx = E::COLUMNS.len() + 1;
            let id_idx = now_idx + 1;
            values.push(Value::Integer(now));
            values.push(Value::Integer(id));

            conn.execute(
                &format!(
                    "UPDATE {}
                     SET {assignments},
                         updated_at = MAX(?{now_idx}, updated_at + 1)
                     WHERE id = ?{id_idx};",
                    E::TABLE
                ),
                params_from_iter(values),
            )?;
            return Ok((id, UpsertOutcome::Updated));
        }
    }

    let columns = E::COLUMNS.join(", ");
    let placeholders = (1..=E::COLUMNS.len() + 3)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut insert_values = vec![
        entity.id().map_or(Value::Null, Value::Integer),
        Value::Integer(now),
        Value::Integer(now),
    ];
    insert_values.append(&mut values);

    conn.execute(
        &format!(
            "INSERT INTO {} (id, created_at, updated_at, {columns}) VALUES ({placeholders});",
            E::TABLE
        ),
        params_from_iter(insert_values),
    )?;

    let id = entity.id().unwrap_or_else(|| conn.last_insert_rowid());
    Ok((id, UpsertOutcome::Created))
}

#[cfg(test)]
mod tests {
    use super::{Filters, RepoError};
    use crate::model::entity::EntityKind;
    use rusqlite::types::Value;

    #[test]
    fn empty_filters_produce_no_where_clause() {
        let (sql, values) = Filters::new().where_clause(EntityKind::Skill).unwrap();
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn filters_are_conjunctive_and_bound_in_order() {
        let filters = Filters::new()
            .eq("user_id", "guest@studio".to_string())
            .eq("name", "fetch_page".to_string());
        let (sql, values) = filters.where_clause(EntityKind::Skill).unwrap();
        assert_eq!(sql, " WHERE user_id = ? AND name = ?");
        assert_eq!(
            values,
            vec![
                Value::Text("guest@studio".to_string()),
                Value::Text("fetch_page".to_string())
            ]
        );
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let err = Filters::new()
            .eq("nickname", "x".to_string())
            .where_clause(EntityKind::Agent)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnknownField { kind: EntityKind::Agent, ref field } if field == "nickname"
        ));
    }

    #[test]
    fn describe_fields_never_includes_values() {
        let filters = Filters::new().eq("api_key", "sk-secret".to_string());
        assert_eq!(filters.describe_fields(), "api_key");
        assert_eq!(Filters::new().describe_fields(), "*");
    }
}
