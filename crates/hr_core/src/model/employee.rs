//! Employee read model.
//!
//! Reviews only need to know that an employee exists, so this type carries
//! the row as stored and nothing else.

use serde::Serialize;

/// Store-assigned employee row identifier.
pub type EmployeeId = i64;

/// One row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub job_title: Option<String>,
    pub department_id: Option<i64>,
}
