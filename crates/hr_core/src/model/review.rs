//! Review record and its field rules.
//!
//! # Responsibility
//! - Hold one performance review as an in-memory value.
//! - Validate every field on construction and on each setter call.
//!
//! # Invariants
//! - `year >= MIN_REVIEW_YEAR`.
//! - `summary` is non-empty after trimming; the stored text is not trimmed.
//! - `employee_id` resolved through an `EmployeeDirectory` when assigned. It is
//!   not re-checked on reads.
//! - `id` is `None` until the row is inserted and again after it is deleted.

use crate::model::employee::EmployeeId;
use crate::repo::employee_repo::EmployeeDirectory;
use crate::repo::RepoResult;
use serde::Serialize;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Store-assigned review row identifier.
pub type ReviewId = i64;

/// Shared live instance of a review.
///
/// The identity cache hands out clones of the same handle for one row, so
/// `Rc::ptr_eq` is the identity test.
pub type ReviewHandle = Rc<RefCell<Review>>;

/// Earliest accepted review year.
pub const MIN_REVIEW_YEAR: i64 = 2000;

/// Field rule violations for `Review`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    YearNotInteger,
    YearTooEarly(i64),
    SummaryNotString,
    SummaryEmpty,
    EmployeeIdNotInteger,
    UnknownEmployee(EmployeeId),
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearNotInteger => write!(f, "year must be an int"),
            Self::YearTooEarly(_) => write!(f, "year must be {MIN_REVIEW_YEAR} or later"),
            Self::SummaryNotString => write!(f, "summary must be a string"),
            Self::SummaryEmpty => write!(f, "summary cannot be empty"),
            Self::EmployeeIdNotInteger => write!(f, "employee_id must be an int"),
            Self::UnknownEmployee(_) => {
                write!(f, "employee_id must refer to an existing Employee")
            }
        }
    }
}

impl Error for ReviewValidationError {}

/// One performance review.
///
/// Fields are private so every mutation goes through a validating setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Builds an unsaved review after validating all three fields.
    ///
    /// # Errors
    /// - `RepoError::Validation` for the first field that breaks its rule,
    ///   checked in `year`, `summary`, `employee_id` order.
    /// - `RepoError::Db` when the employee lookup itself fails.
    pub fn new<D>(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &D,
    ) -> RepoResult<Self>
    where
        D: EmployeeDirectory + ?Sized,
    {
        let year = validate_year(year)?;
        let summary = validate_summary(summary.into())?;
        let employee_id = validate_employee_id(employee_id, employees)?;

        Ok(Self {
            id: None,
            year,
            summary,
            employee_id,
        })
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    /// Whether this review currently corresponds to a stored row.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Replaces `year`; leaves the old value in place on failure.
    pub fn set_year(&mut self, year: i64) -> Result<(), ReviewValidationError> {
        self.year = validate_year(year)?;
        Ok(())
    }

    /// Replaces `summary`; leaves the old value in place on failure.
    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ReviewValidationError> {
        self.summary = validate_summary(summary.into())?;
        Ok(())
    }

    /// Points the review at another employee after checking it exists.
    pub fn set_employee_id<D>(&mut self, employee_id: EmployeeId, employees: &D) -> RepoResult<()>
    where
        D: EmployeeDirectory + ?Sized,
    {
        self.employee_id = validate_employee_id(employee_id, employees)?;
        Ok(())
    }

    /// Wraps this value into a shared handle.
    pub fn into_handle(self) -> ReviewHandle {
        Rc::new(RefCell::new(self))
    }

    pub(crate) fn assign_id(&mut self, id: ReviewId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    /// Copies the field values of an already validated review; `id` is kept.
    pub(crate) fn refresh_from(&mut self, other: Review) {
        self.year = other.year;
        self.summary = other.summary;
        self.employee_id = other.employee_id;
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {id}: ")?,
            None => write!(f, "<Review None: ")?,
        }
        write!(
            f,
            "{}, {}, Employee: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

fn validate_year(year: i64) -> Result<i64, ReviewValidationError> {
    if year < MIN_REVIEW_YEAR {
        return Err(ReviewValidationError::YearTooEarly(year));
    }
    Ok(year)
}

fn validate_summary(summary: String) -> Result<String, ReviewValidationError> {
    if summary.trim().is_empty() {
        return Err(ReviewValidationError::SummaryEmpty);
    }
    Ok(summary)
}

fn validate_employee_id<D>(employee_id: EmployeeId, employees: &D) -> RepoResult<EmployeeId>
where
    D: EmployeeDirectory + ?Sized,
{
    match employees.find_by_id(employee_id)? {
        Some(_) => Ok(employee_id),
        None => Err(ReviewValidationError::UnknownEmployee(employee_id).into()),
    }
}
