//! Link repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Map each `LinkKind` to its join table.
//! - Run the resolve / check / mutate sequence of link and unlink in one
//!   transaction.
//! - Load the typed secondary collection of a primary entity.
//!
//! # Invariants
//! - A join row exists only when both endpoints exist (foreign keys plus the
//!   endpoint check inside the transaction).
//! - At most one join row per `(kind, primary, secondary)`: the duplicate check
//!   runs under `BEGIN IMMEDIATE`, and the composite primary key rejects
//!   anything that slips past it.
//! - Missing endpoints and duplicates are outcomes, not errors; only
//!   persistence failures surface as `RepoError`.

use crate::model::agent::Agent;
use crate::model::entity::{EntityId, EntityKind};
use crate::model::link::{LinkKind, LinkedEntities};
use crate::model::llm_model::LlmModel;
use crate::model::skill::Skill;
use crate::repo::ensure_tables;
use crate::repo::entity_repo::{entity_exists, RepoResult};
use crate::repo::entity_rows::{select_list, StoredEntity};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Join table backing one link kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTable {
    pub table: &'static str,
    pub primary_column: &'static str,
    pub secondary_column: &'static str,
}

/// Join table for `kind`. The match is the dispatch table: adding a kind
/// without a join table does not compile.
pub fn join_table(kind: LinkKind) -> JoinTable {
    match kind {
        LinkKind::AgentModel => JoinTable {
            table: "agent_model_links",
            primary_column: "agent_id",
            secondary_column: "model_id",
        },
        LinkKind::AgentSkill => JoinTable {
            table: "agent_skill_links",
            primary_column: "agent_id",
            secondary_column: "skill_id",
        },
        LinkKind::AgentAgent => JoinTable {
            table: "agent_links",
            primary_column: "parent_id",
            secondary_column: "child_id",
        },
        LinkKind::WorkflowAgent => JoinTable {
            table: "workflow_agent_links",
            primary_column: "workflow_id",
            secondary_column: "agent_id",
        },
    }
}

/// Result of a link or unlink attempt that reached storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The join row was inserted (link) or deleted (unlink).
    Applied,
    /// Link found an existing join row; nothing changed.
    AlreadyLinked,
    /// Unlink found no join row; nothing changed.
    NotLinked,
    /// An endpoint does not exist; nothing changed.
    MissingEndpoint { kind: EntityKind, id: EntityId },
}

/// Repository interface for typed link operations.
pub trait LinkRepository {
    /// Inserts the join row for `(kind, primary_id, secondary_id)`.
    fn link(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
        secondary_id: EntityId,
    ) -> RepoResult<LinkOutcome>;
    /// Deletes the join row for `(kind, primary_id, secondary_id)`.
    fn unlink(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
        secondary_id: EntityId,
    ) -> RepoResult<LinkOutcome>;
    /// Loads the secondaries linked to `primary_id`, or `None` when the
    /// primary does not exist.
    fn linked_entities(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
    ) -> RepoResult<Option<LinkedEntities>>;
    /// Counts join rows of `kind`.
    fn count_links(&self, kind: LinkKind) -> RepoResult<u64>;
}

/// SQLite-backed link repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let tables = LinkKind::ALL.map(|kind| join_table(kind).table);
        ensure_tables(conn, &tables)?;
        Ok(Self { conn })
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn link(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
        secondary_id: EntityId,
    ) -> RepoResult<LinkOutcome> {
        let join = join_table(kind);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if let Some(missing) = missing_endpoint(&tx, kind, primary_id, secondary_id)? {
            return Ok(missing);
        }
        if join_exists(&tx, join, primary_id, secondary_id)? {
            return Ok(LinkOutcome::AlreadyLinked);
        }

        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2);",
                join.table, join.primary_column, join.secondary_column
            ),
            params![primary_id, secondary_id],
        )?;
        tx.commit()?;
        Ok(LinkOutcome::Applied)
    }

    fn unlink(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
        secondary_id: EntityId,
    ) -> RepoResult<LinkOutcome> {
        let join = join_table(kind);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if let Some(missing) = missing_endpoint(&tx, kind, primary_id, secondary_id)? {
            return Ok(missing);
        }

        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2;",
                join.table, join.primary_column, join.secondary_column
            ),
            params![primary_id, secondary_id],
        )?;
        if removed == 0 {
            return Ok(LinkOutcome::NotLinked);
        }

        tx.commit()?;
        Ok(LinkOutcome::Applied)
    }

    fn linked_entities(
        &self,
        kind: LinkKind,
        primary_id: EntityId,
    ) -> RepoResult<Option<LinkedEntities>> {
        if !entity_exists(self.conn, kind.primary(), primary_id)? {
            return Ok(None);
        }

        let join = join_table(kind);
        let linked = match kind {
            LinkKind::AgentModel => {
                LinkedEntities::Models(load_linked::<LlmModel>(self.conn, join, primary_id)?)
            }
            LinkKind::AgentSkill => {
                LinkedEntities::Skills(load_linked::<Skill>(self.conn, join, primary_id)?)
            }
            LinkKind::AgentAgent | LinkKind::WorkflowAgent => {
                LinkedEntities::Agents(load_linked::<Agent>(self.conn, join, primary_id)?)
            }
        };
        Ok(Some(linked))
    }

    fn count_links(&self, kind: LinkKind) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", join_table(kind).table),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn missing_endpoint(
    conn: &Connection,
    kind: LinkKind,
    primary_id: EntityId,
    secondary_id: EntityId,
) -> RepoResult<Option<LinkOutcome>> {
    for (entity_kind, id) in [
        (kind.primary(), primary_id),
        (kind.secondary(), secondary_id),
    ] {
        if !entity_exists(conn, entity_kind, id)? {
            return Ok(Some(LinkOutcome::MissingEndpoint {
                kind: entity_kind,
                id,
            }));
        }
    }
    Ok(None)
}

fn join_exists(
    conn: &Connection,
    join: JoinTable,
    primary_id: EntityId,
    secondary_id: EntityId,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2);",
            join.table, join.primary_column, join.secondary_column
        ),
        params![primary_id, secondary_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Secondaries of `primary_id` in link insertion order.
fn load_linked<E: StoredEntity>(
    conn: &Connection,
    join: JoinTable,
    primary_id: EntityId,
) -> RepoResult<Vec<E>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}
         FROM {} e
         INNER JOIN {} l ON l.{} = e.id
         WHERE l.{} = ?1
         ORDER BY l.rowid ASC;",
        select_list::<E>(Some("e")),
        E::TABLE,
        join.table,
        join.secondary_column,
        join.primary_column
    ))?;
    let mut rows = stmt.query([primary_id])?;
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(E::from_row(row)?);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::join_table;
    use crate::model::link::LinkKind;
    use std::collections::HashSet;

    #[test]
    fn every_kind_has_its_own_join_table() {
        let tables: HashSet<_> = LinkKind::ALL
            .iter()
            .map(|kind| join_table(*kind).table)
            .collect();
        assert_eq!(tables.len(), LinkKind::ALL.len());
    }

    #[test]
    fn agent_agent_join_is_parent_to_child() {
        let join = join_table(LinkKind::AgentAgent);
        assert_eq!(join.primary_column, "parent_id");
        assert_eq!(join.secondary_column, "child_id");
    }
}
