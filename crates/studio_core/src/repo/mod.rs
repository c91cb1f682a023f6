//! Repository layer: SQL, transactions and row mapping.
//!
//! # Responsibility
//! - Keep every SQL statement inside the persistence boundary.
//! - Run each mutation in exactly one transaction.
//!
//! # Invariants
//! - Repositories borrow a caller-owned connection and never close it.
//! - A transaction that is not committed is rolled back on drop, so an
//!   early `?` return never leaves a partial write behind.
//! - Table and column names come from static tables in this module tree;
//!   caller-supplied text is only ever bound as a parameter.

pub mod entity_repo;
pub mod entity_rows;
pub mod link_repo;

use entity_repo::{RepoError, RepoResult};
use rusqlite::Connection;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
