//! Review use-case service.
//!
//! # Invariants
//! - Every call goes through the repository, so validation and the identity
//!   cache are never bypassed.

use crate::model::employee::EmployeeId;
use crate::model::review::{ReviewHandle, ReviewId};
use crate::repo::review_repo::ReviewRepository;
use crate::repo::{RepoError, RepoResult};

/// Use-case wrapper for review record operations.
pub struct ReviewService<R: ReviewRepository> {
    repo: R,
}

/// Field edits applied by `ReviewService::revise_review`.
///
/// `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRevision {
    pub year: Option<i64>,
    pub summary: Option<String>,
    pub employee_id: Option<EmployeeId>,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrow of the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates the reviews table if needed.
    pub fn ensure_schema(&self) -> RepoResult<()> {
        self.repo.create_table()
    }

    /// Drops and recreates the reviews table, emptying the identity cache.
    pub fn reset_schema(&self) -> RepoResult<()> {
        self.repo.drop_table()?;
        self.repo.create_table()
    }

    /// Records a new review for an existing employee.
    pub fn record_review(
        &self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        self.repo.create(year, summary, employee_id)
    }

    pub fn get_review(&self, id: ReviewId) -> RepoResult<Option<ReviewHandle>> {
        self.repo.find_by_id(id)
    }

    pub fn list_reviews(&self) -> RepoResult<Vec<ReviewHandle>> {
        self.repo.get_all()
    }

    pub fn list_reviews_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> RepoResult<Vec<ReviewHandle>> {
        self.repo.find_by_employee(employee_id)
    }

    /// Applies field edits to a saved review and persists them.
    ///
    /// # Contract
    /// - All edits are validated before the row is written.
    /// - On a validation failure the instance keeps its previous values.
    /// - Unsaved reviews fail with `RepoError::Unsaved` before any edit.
    /// - When the row write fails, the instance is restored to its prior values.
    pub fn revise_review(
        &self,
        review: &ReviewHandle,
        revision: &ReviewRevision,
    ) -> RepoResult<ReviewHandle> {
        let mut draft = review
            .try_borrow()
            .map_err(|_| RepoError::InstanceBorrowed)?
            .clone();
        if !draft.is_saved() {
            return Err(RepoError::Unsaved);
        }
        if let Some(year) = revision.year {
            draft.set_year(year)?;
        }
        if let Some(summary) = revision.summary.as_deref() {
            draft.set_summary(summary)?;
        }
        let scratch = draft.into_handle();
        if let Some(employee_id) = revision.employee_id {
            self.repo.assign_employee(&scratch, employee_id)?;
        }

        let validated = scratch.borrow().clone();
        let previous = {
            let mut current = review
                .try_borrow_mut()
                .map_err(|_| RepoError::InstanceBorrowed)?;
            let previous = current.clone();
            current.refresh_from(validated);
            previous
        };

        self.repo.update(review).inspect_err(|_| {
            if let Ok(mut current) = review.try_borrow_mut() {
                current.refresh_from(previous);
            }
        })
    }

    /// Persists in-memory edits of a saved review.
    pub fn save_changes(&self, review: &ReviewHandle) -> RepoResult<ReviewHandle> {
        self.repo.update(review)
    }

    /// Deletes the review's row; unsaved reviews are left untouched.
    pub fn remove_review(&self, review: &ReviewHandle) -> RepoResult<()> {
        self.repo.delete(review)
    }
}
