//! SQLite connection bootstrap for HR records.
//!
//! # Responsibility
//! - Open connections that record repositories can rely on.
//! - Own the collaborator tables (`departments`, `employees`) through
//!   versioned migrations.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - The `reviews` table is not migration-managed; it is created and dropped
//!   through `ReviewRepository` schema operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure surfaced by bootstrap and repository calls.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// One migration script failed; nothing from the batch was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl DbError {
    /// Schema version involved in the failure, when there is one.
    pub fn schema_version(&self) -> Option<u32> {
        match self {
            Self::Sqlite(_) => None,
            Self::Migration { version, .. } => Some(*version),
            Self::UnsupportedSchemaVersion { db_version, .. } => Some(*db_version),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
