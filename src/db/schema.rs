use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, error, info};

use super::error::{StoreError, StoreResult};

pub(crate) const EMPLOYEES_TABLE: &str = "employees";
pub(crate) const QUALIFICATIONS_TABLE: &str = "qualifications";

/// RFC 3339 UTC padded to microseconds so defaulted rows sort correctly
/// against the text the store writes. SQLite only resolves milliseconds.
const NOW_DEFAULT: &str = "(strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))";

/// Make sure both relations and the name index exist. Every statement uses
/// `IF NOT EXISTS`, so two processes racing past the catalog check both
/// succeed and calling this before every operation is cheap.
pub fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    bootstrap(conn).map_err(|err| {
        error!(error = %format!("{err:#}"), "schema bootstrap failed");
        StoreError::Schema(err)
    })
}

fn bootstrap(conn: &Connection) -> Result<()> {
    let existing = existing_tables(conn)?;
    debug!(tables = ?existing, "existing tables");

    if !existing.iter().any(|name| name == EMPLOYEES_TABLE) {
        info!("creating employees table");
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS employees (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    designation TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT {NOW_DEFAULT},
                    updated_at TEXT NOT NULL DEFAULT {NOW_DEFAULT}
                )"
            ),
            [],
        )
        .context("failed to create employees table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_employee_name ON employees(name)",
            [],
        )
        .context("failed to create employee name index")?;
    }

    if !existing.iter().any(|name| name == QUALIFICATIONS_TABLE) {
        info!("creating qualifications table");
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS qualifications (
                    id TEXT PRIMARY KEY NOT NULL,
                    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                    institution TEXT NOT NULL,
                    year_of_completion TEXT NOT NULL,
                    designation TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT {NOW_DEFAULT},
                    updated_at TEXT NOT NULL DEFAULT {NOW_DEFAULT}
                )"
            ),
            [],
        )
        .context("failed to create qualifications table")?;
    }

    Ok(())
}

/// Which of the two required relations the catalog already knows about.
fn existing_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name IN (?1, ?2)",
        )
        .context("failed to prepare catalog query")?;

    let tables = stmt
        .query_map([EMPLOYEES_TABLE, QUALIFICATIONS_TABLE], |row| row.get(0))
        .context("failed to query catalog")?
        .collect::<Result<Vec<String>, _>>()
        .context("failed to collect table names")?;

    Ok(tables)
}
