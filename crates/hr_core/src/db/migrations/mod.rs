//! Versioned schema migrations for collaborator tables.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - All pending migrations run inside one transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Latest schema version this build knows how to produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads `PRAGMA user_version` from the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn run_pending(conn: &mut Connection, migrations: &[Migration], current: u32) -> DbResult<()> {
    let tx = conn.transaction()?;
    for migration in migrations.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                source,
            })?;
    }
    tx.commit()?;
    Ok(())
}

/// Brings the connection up to `latest_version()`.
///
/// Fails with `UnsupportedSchemaVersion` when the database was written by a
/// newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    run_pending(conn, MIGRATIONS, current)?;

    info!("event=db_migrate module=db status=ok from_version={current} to_version={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run_pending, schema_version, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn failing_migration_reports_its_version_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrations = [
            Migration {
                version: 1,
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                sql: "CREATE TABLE broken (",
            },
        ];

        let err = run_pending(&mut conn, &migrations, 0).unwrap_err();
        assert!(matches!(err, DbError::Migration { version: 2, .. }));
        assert_eq!(err.schema_version(), Some(2));
        assert!(err.to_string().starts_with("migration 2 failed:"));

        assert_eq!(schema_version(&conn).unwrap(), 0);
        let first_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'first');",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!first_exists);
    }

    #[test]
    fn pending_migrations_skip_applied_versions() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 1;").unwrap();
        let migrations = [
            Migration {
                version: 1,
                sql: "CREATE TABLE broken (",
            },
            Migration {
                version: 2,
                sql: "CREATE TABLE second (id INTEGER PRIMARY KEY);",
            },
        ];

        run_pending(&mut conn, &migrations, 1).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }
}
