//! Review repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `reviews` rows to live `Review` instances and back.
//! - Keep the identity cache in step with inserts, updates and deletes.
//! - Own the `reviews` table schema operations.
//!
//! # Invariants
//! - A cached instance with an id matches the stored row with that id.
//! - The cache never holds two distinct instances for one id.
//! - Rows read from storage pass the same validation as new reviews; a row
//!   that fails it is reported, never cached.
//! - `save` and `delete` take the instance's write borrow before touching
//!   storage; a borrowed handle fails with no row written or removed.

use crate::db::migrations::{latest_version, schema_version};
use crate::model::employee::EmployeeId;
use crate::model::review::{Review, ReviewHandle, ReviewId, ReviewValidationError};
use crate::repo::employee_repo::{EmployeeDirectory, SqliteEmployeeDirectory};
use crate::repo::identity_cache::IdentityCache;
use crate::repo::{RepoError, RepoResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Params, Row};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

const REVIEW_SELECT_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews";

const CREATE_REVIEWS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    year INT,
    summary TEXT,
    employee_id INTEGER,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);";

/// Raw column values of one `reviews` row.
///
/// Values keep their SQLite storage class so that rows holding the wrong
/// kind of data can be reported field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub id: Value,
    pub year: Value,
    pub summary: Value,
    pub employee_id: Value,
}

impl ReviewRow {
    /// Row with well-typed values, as the store would return it.
    pub fn new(
        id: ReviewId,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id: Value::Integer(id),
            year: Value::Integer(year),
            summary: Value::Text(summary.into()),
            employee_id: Value::Integer(employee_id),
        }
    }

    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("year")?,
            summary: row.get("summary")?,
            employee_id: row.get("employee_id")?,
        })
    }
}

/// Repository interface for review records.
pub trait ReviewRepository {
    /// Creates the `reviews` table if it does not exist yet.
    fn create_table(&self) -> RepoResult<()>;
    /// Drops the `reviews` table and empties the identity cache.
    fn drop_table(&self) -> RepoResult<()>;
    /// Builds an unsaved, validated review using this repository's employee
    /// lookup.
    fn new_review(&self, year: i64, summary: &str, employee_id: EmployeeId)
        -> RepoResult<Review>;
    /// Reassigns a live review to another (existing) employee in memory.
    fn assign_employee(&self, review: &ReviewHandle, employee_id: EmployeeId) -> RepoResult<()>;
    /// Inserts an unsaved review, assigns its id and caches it.
    ///
    /// Fails with `InstanceBorrowed` before touching storage when the handle
    /// is borrowed elsewhere.
    fn save(&self, review: &ReviewHandle) -> RepoResult<ReviewHandle>;
    /// Builds and saves a review in one step.
    fn create(&self, year: i64, summary: &str, employee_id: EmployeeId)
        -> RepoResult<ReviewHandle>;
    /// Resolves a row to its live instance, refreshing a cached one in place.
    fn instance_from_db(&self, row: Option<ReviewRow>) -> RepoResult<Option<ReviewHandle>>;
    /// Returns the cached instance, or loads the row when it is not cached.
    fn find_by_id(&self, id: ReviewId) -> RepoResult<Option<ReviewHandle>>;
    /// Lists the reviews of one employee in row order.
    fn find_by_employee(&self, employee_id: EmployeeId) -> RepoResult<Vec<ReviewHandle>>;
    /// Overwrites the stored row with the instance's current values.
    ///
    /// Returns `NotFound` when no row has the instance's id, instead of
    /// silently re-caching an instance whose row is gone.
    fn update(&self, review: &ReviewHandle) -> RepoResult<ReviewHandle>;
    /// Removes the stored row and clears the instance's id; no-op when unsaved.
    ///
    /// Like `save`, a borrowed handle is rejected before the row is removed.
    fn delete(&self, review: &ReviewHandle) -> RepoResult<()>;
    /// Lists every review in row order.
    fn get_all(&self) -> RepoResult<Vec<ReviewHandle>>;
    /// Number of live instances in the identity cache.
    fn cached_count(&self) -> usize;
    fn is_cached(&self, id: ReviewId) -> bool;
}

/// SQLite-backed review repository.
///
/// The identity cache lives and dies with this value, which cannot outlive
/// the borrowed connection.
pub struct SqliteReviewRepository<'conn, D: EmployeeDirectory = SqliteEmployeeDirectory<'conn>> {
    conn: &'conn Connection,
    employees: D,
    cache: RefCell<IdentityCache<Review>>,
}

impl<'conn> SqliteReviewRepository<'conn, SqliteEmployeeDirectory<'conn>> {
    /// Constructs a repository that resolves employees from the same
    /// connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_directory(conn, SqliteEmployeeDirectory::new(conn))
    }
}

impl<'conn, D: EmployeeDirectory> SqliteReviewRepository<'conn, D> {
    /// Constructs a repository with an injected employee lookup.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the `employees` table is absent.
    pub fn with_directory(conn: &'conn Connection, employees: D) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            employees,
            cache: RefCell::new(IdentityCache::new()),
        })
    }

    fn query_rows<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<ReviewRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(ReviewRow::from_sql_row(row)?);
        }
        Ok(out)
    }

    fn instances_from_rows(&self, rows: Vec<ReviewRow>) -> RepoResult<Vec<ReviewHandle>> {
        let mut reviews = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(handle) = self.instance_from_db(Some(row))? {
                reviews.push(handle);
            }
        }
        Ok(reviews)
    }

    /// Decodes and validates a row into an unsaved review.
    fn review_from_row(&self, row: &ReviewRow) -> RepoResult<Review> {
        let year = match row.year {
            Value::Integer(value) => value,
            _ => return Err(ReviewValidationError::YearNotInteger.into()),
        };
        let summary = match &row.summary {
            Value::Text(value) => value.clone(),
            _ => return Err(ReviewValidationError::SummaryNotString.into()),
        };
        let employee_id = match row.employee_id {
            Value::Integer(value) => value,
            _ => return Err(ReviewValidationError::EmployeeIdNotInteger.into()),
        };

        Review::new(year, summary, employee_id, &self.employees)
    }
}

impl<D: EmployeeDirectory> ReviewRepository for SqliteReviewRepository<'_, D> {
    fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(CREATE_REVIEWS_TABLE_SQL)?;
        info!("event=reviews_create_table module=repo status=ok");
        Ok(())
    }

    fn drop_table(&self) -> RepoResult<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS reviews;")?;
        let cleared = self.cache.borrow_mut().clear();
        info!("event=reviews_drop_table module=repo status=ok cleared_entries={cleared}");
        Ok(())
    }

    fn new_review(
        &self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<Review> {
        Review::new(year, summary, employee_id, &self.employees)
    }

    fn assign_employee(&self, review: &ReviewHandle, employee_id: EmployeeId) -> RepoResult<()> {
        write_handle(review)?.set_employee_id(employee_id, &self.employees)
    }

    fn save(&self, review: &ReviewHandle) -> RepoResult<ReviewHandle> {
        let mut current = write_handle(review)?;
        if let Some(id) = current.id() {
            return Err(RepoError::AlreadySaved(id));
        }

        self.conn.execute(
            "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
            params![current.year(), current.summary(), current.employee_id()],
        )?;
        let id = self.conn.last_insert_rowid();
        current.assign_id(id);
        drop(current);

        self.cache.borrow_mut().insert(id, Rc::clone(review));
        debug!("event=review_save module=repo status=ok review_id={id}");
        Ok(Rc::clone(review))
    }

    fn create(
        &self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        let review = self.new_review(year, summary, employee_id)?.into_handle();
        self.save(&review)
    }

    fn instance_from_db(&self, row: Option<ReviewRow>) -> RepoResult<Option<ReviewHandle>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let id = match row.id {
            Value::Integer(id) => id,
            ref other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid id value `{other:?}` in reviews.id"
                )));
            }
        };
        let loaded = self.review_from_row(&row)?;

        let cached = self.cache.borrow().get(id);
        if let Some(handle) = cached {
            write_handle(&handle)?.refresh_from(loaded);
            return Ok(Some(handle));
        }

        let mut review = loaded;
        review.assign_id(id);
        let handle = review.into_handle();
        self.cache.borrow_mut().insert(id, Rc::clone(&handle));
        Ok(Some(handle))
    }

    fn find_by_id(&self, id: ReviewId) -> RepoResult<Option<ReviewHandle>> {
        if let Some(handle) = self.cache.borrow().get(id) {
            return Ok(Some(handle));
        }

        let row = self
            .query_rows(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"), params![id])?
            .into_iter()
            .next();
        self.instance_from_db(row)
    }

    fn find_by_employee(&self, employee_id: EmployeeId) -> RepoResult<Vec<ReviewHandle>> {
        let rows = self.query_rows(
            &format!("{REVIEW_SELECT_SQL} WHERE employee_id = ?1 ORDER BY id ASC;"),
            params![employee_id],
        )?;
        self.instances_from_rows(rows)
    }

    fn update(&self, review: &ReviewHandle) -> RepoResult<ReviewHandle> {
        let (id, year, summary, employee_id) = {
            let current = read_handle(review)?;
            let id = current.id().ok_or(RepoError::Unsaved)?;
            (
                id,
                current.year(),
                current.summary().to_string(),
                current.employee_id(),
            )
        };

        let changed = self.conn.execute(
            "UPDATE reviews SET year = ?1, summary = ?2, employee_id = ?3 WHERE id = ?4;",
            params![year, summary, employee_id, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.cache.borrow_mut().insert(id, Rc::clone(review));
        debug!("event=review_update module=repo status=ok review_id={id}");
        Ok(Rc::clone(review))
    }

    fn delete(&self, review: &ReviewHandle) -> RepoResult<()> {
        let mut current = write_handle(review)?;
        let Some(id) = current.id() else {
            return Ok(());
        };

        let removed_rows = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", params![id])?;
        current.clear_id();
        drop(current);
        let evicted = self.cache.borrow_mut().remove(id).is_some();

        debug!(
            "event=review_delete module=repo status=ok review_id={id} removed_rows={removed_rows} evicted={evicted}"
        );
        Ok(())
    }

    fn get_all(&self) -> RepoResult<Vec<ReviewHandle>> {
        let rows = self.query_rows(&format!("{REVIEW_SELECT_SQL} ORDER BY id ASC;"), [])?;
        self.instances_from_rows(rows)
    }

    fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }

    fn is_cached(&self, id: ReviewId) -> bool {
        self.cache.borrow().contains(id)
    }
}

fn read_handle(handle: &ReviewHandle) -> RepoResult<Ref<'_, Review>> {
    handle.try_borrow().map_err(|_| RepoError::InstanceBorrowed)
}

fn write_handle(handle: &ReviewHandle) -> RepoResult<RefMut<'_, Review>> {
    handle.try_borrow_mut().map_err(|_| RepoError::InstanceBorrowed)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let has_employees: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'employees'
        );",
        [],
        |row| row.get(0),
    )?;
    if !has_employees {
        return Err(RepoError::MissingRequiredTable("employees"));
    }

    Ok(())
}
