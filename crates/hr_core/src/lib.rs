//! Record mapping for the HR data model.
//! Owns the review record rules, its SQLite persistence and identity cache.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{Employee, EmployeeId};
pub use model::review::{Review, ReviewHandle, ReviewId, ReviewValidationError, MIN_REVIEW_YEAR};
pub use repo::employee_repo::{EmployeeDirectory, SqliteEmployeeDirectory};
pub use repo::identity_cache::IdentityCache;
pub use repo::review_repo::{ReviewRepository, ReviewRow, SqliteReviewRepository};
pub use repo::{RepoError, RepoResult};
pub use service::review_service::{ReviewRevision, ReviewService};

/// Health check used by the CLI.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
