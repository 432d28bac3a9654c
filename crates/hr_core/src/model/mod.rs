//! Record types for the HR data model.
//!
//! # Responsibility
//! - Define the in-memory shape of persisted rows.
//! - Enforce field invariants at assignment time.
//!
//! # Invariants
//! - A `Review` value is always fully valid; there is no partially-valid state.
//! - Row identifiers are store-assigned integers.

pub mod employee;
pub mod review;
