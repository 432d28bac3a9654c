//! Persistence layer for HR records.
//!
//! # Responsibility
//! - Keep SQL inside repository implementations.
//! - Own the identity cache that maps row ids to live instances.
//! - Report semantic failures (`NotFound`, `Unsaved`) next to storage ones.
//!
//! # Invariants
//! - Write paths only ever see fully validated `Review` values.
//! - Read paths validate persisted rows instead of masking bad data.

use crate::db::DbError;
use crate::model::review::{ReviewId, ReviewValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod employee_repo;
pub mod identity_cache;
pub mod review_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReviewValidationError),
    Db(DbError),
    NotFound(ReviewId),
    /// `update` was called on a review that has never been saved.
    Unsaved,
    /// `save` was called on a review that already owns a row.
    AlreadySaved(ReviewId),
    InvalidData(String),
    /// A live instance could not be accessed because the caller holds a
    /// conflicting borrow of its handle.
    InstanceBorrowed,
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "review not found: {id}"),
            Self::Unsaved => write!(f, "can't update a Review without an id; save it first"),
            Self::AlreadySaved(id) => write!(f, "review {id} is already saved; use update"),
            Self::InvalidData(message) => write!(f, "invalid persisted review data: {message}"),
            Self::InstanceBorrowed => {
                write!(f, "review instance is borrowed elsewhere; release it and retry")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not bootstrapped: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
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
