//! Store session bootstrap.
//!
//! # Responsibility
//! - Hand callers one configured SQLite connection per store session.
//! - Bring the entity and join tables up to the latest schema.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last migration applied.
//! - A failed migration names its step and leaves the previous schema intact.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening a session or evolving its schema.
#[derive(Debug)]
pub enum DbError {
    /// Connection setup or a statement outside any migration step failed.
    Sqlite(rusqlite::Error),
    /// One schema step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build with tables this one cannot read.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl DbError {
    /// Schema version the error refers to, when it is about the schema.
    pub fn schema_version(&self) -> Option<u32> {
        match self {
            Self::Sqlite(_) => None,
            Self::Migration { version, .. } => Some(*version),
            Self::UnsupportedSchemaVersion { found, .. } => Some(*found),
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "schema step v{version} ({name}) failed: {source}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "store schema v{found} is newer than this build supports (v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
