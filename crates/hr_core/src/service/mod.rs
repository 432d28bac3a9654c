//! Use-case services over record repositories.
//!
//! # Responsibility
//! - Give callers (CLI, tests) stable entry points.
//! - Stay storage-agnostic; all SQL lives in `repo`.

pub mod review_service;
