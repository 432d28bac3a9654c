//! Employee lookup capability used for foreign-key checks.
//!
//! # Responsibility
//! - Resolve an employee id to its stored row, or to nothing.
//!
//! # Invariants
//! - Lookups are read-only.

use crate::model::employee::{Employee, EmployeeId};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Resolve-by-id capability injected into record types that reference
/// employees.
pub trait EmployeeDirectory {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
}

impl<T: EmployeeDirectory + ?Sized> EmployeeDirectory for &T {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        (**self).find_by_id(id)
    }
}

/// Reads employees from the `employees` table.
pub struct SqliteEmployeeDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeDirectory for SqliteEmployeeDirectory<'_> {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, job_title, department_id
             FROM employees
             WHERE id = ?1;",
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Employee {
                id: row.get("id")?,
                name: row.get("name")?,
                job_title: row.get("job_title")?,
                department_id: row.get("department_id")?,
            }));
        }

        Ok(None)
    }
}
