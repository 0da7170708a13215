use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Error as SqlError, Row};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{Employee, NewEmployee, NewQualification, Qualification};

use super::error::{StoreError, StoreResult};
use super::schema::ensure_schema;

/// Employees joined with their qualifications. Child columns are NULL for an
/// employee without qualifications.
const SELECT_JOINED: &str = "SELECT e.id, e.name, e.age, e.designation, e.created_at, e.updated_at,
            q.id, q.institution, q.year_of_completion, q.designation
     FROM employees e
     LEFT JOIN qualifications q ON q.employee_id = e.id";

/// Newest employees first. `rowid` breaks ties between rows stamped within
/// the same microsecond so insertion order still wins.
const ORDER_NEWEST_FIRST: &str = "ORDER BY e.created_at DESC, e.rowid DESC, q.rowid";

/// One row of the joined query before grouping.
struct JoinedRow {
    employee: Employee,
    qualification: Option<Qualification>,
}

/// Retrieve every employee with nested qualifications, newest first. A
/// directory whose tables vanished between bootstrap and query reads as empty
/// rather than failing.
pub fn list_employees(conn: &Connection) -> StoreResult<Vec<Employee>> {
    ensure_schema(conn)?;

    let employees = load_all(conn).map_err(|err| {
        error!(error = %format!("{err:#}"), "failed to fetch employees");
        StoreError::Fetch(err)
    })?;
    debug!(count = employees.len(), "fetched employees");
    Ok(employees)
}

/// Look up a single employee. `Ok(None)` means no row carries that id; an id
/// that is not a UUID at all is a fetch error.
pub fn get_employee(conn: &Connection, id: &str) -> StoreResult<Option<Employee>> {
    load_one(conn, id).map_err(|err| {
        error!(employee_id = id, error = %format!("{err:#}"), "failed to fetch employee");
        StoreError::Fetch(err)
    })
}

/// Insert an employee and all of its qualifications in one transaction. If
/// any insert fails the transaction is dropped uncommitted, which rolls back
/// every row written so far. The returned employee is assembled from the
/// inputs and the generated ids instead of being re-read.
pub fn create_employee(
    conn: &Connection,
    employee: &NewEmployee,
    qualifications: &[NewQualification],
) -> StoreResult<Employee> {
    ensure_schema(conn)?;

    let created = insert_with_qualifications(conn, employee, qualifications).map_err(|err| {
        error!(name = %employee.name, error = %format!("{err:#}"), "failed to create employee");
        StoreError::Create(err)
    })?;
    info!(
        employee_id = %created.id,
        qualifications = created.qualifications.len(),
        "employee created"
    );
    Ok(created)
}

/// Delete an employee together with its qualifications. The schema cascades
/// as well; the explicit child delete keeps the behavior identical on
/// connections where foreign keys are off. Deleting twice reports
/// `NotFound` the second time.
pub fn delete_employee(conn: &Connection, id: &str) -> StoreResult<()> {
    match remove_with_qualifications(conn, id) {
        Ok(true) => {
            info!(employee_id = id, "employee deleted");
            Ok(())
        }
        Ok(false) => {
            warn!(employee_id = id, "delete targeted a missing employee");
            Err(StoreError::NotFound { id: id.to_string() })
        }
        Err(err) => {
            error!(employee_id = id, error = %format!("{err:#}"), "failed to delete employee");
            Err(StoreError::Delete(err))
        }
    }
}

fn load_all(conn: &Connection) -> Result<Vec<Employee>> {
    match query_joined(conn, None) {
        Ok(rows) => Ok(group_by_employee(rows)),
        Err(err) if is_missing_relation(&err) => {
            warn!("employee tables do not exist yet, returning an empty directory");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

fn load_one(conn: &Connection, raw_id: &str) -> Result<Option<Employee>> {
    let id = normalize_id(raw_id)?;
    let rows = query_joined(conn, Some(&id))?;
    Ok(group_by_employee(rows).into_iter().next())
}

fn insert_with_qualifications(
    conn: &Connection,
    employee: &NewEmployee,
    qualifications: &[NewQualification],
) -> Result<Employee> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().trunc_subsecs(6);
    let stamp = timestamp_text(now);

    tx.execute(
        "INSERT INTO employees (id, name, age, designation, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, employee.name, employee.age, employee.designation, stamp],
    )
    .context("failed to insert employee")?;

    let mut inserted = Vec::with_capacity(qualifications.len());
    for qualification in qualifications {
        let qualification_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO qualifications (
                 id, employee_id, institution, year_of_completion, designation,
                 created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                qualification_id,
                id,
                qualification.institution,
                qualification.year_of_completion,
                qualification.designation,
                stamp
            ],
        )
        .with_context(|| {
            format!(
                "failed to insert qualification from {}",
                qualification.institution
            )
        })?;

        inserted.push(Qualification {
            id: qualification_id,
            institution: qualification.institution.clone(),
            year_of_completion: qualification.year_of_completion,
            designation: qualification.designation.clone(),
        });
    }

    tx.commit().context("failed to commit employee")?;

    Ok(Employee {
        id,
        name: employee.name.clone(),
        age: employee.age,
        designation: employee.designation.clone(),
        qualifications: inserted,
        created_at: now,
        updated_at: now,
    })
}

/// Returns `false` when no employee matched; the transaction is rolled back
/// in that case so the child delete never lands on its own.
fn remove_with_qualifications(conn: &Connection, raw_id: &str) -> Result<bool> {
    let id = normalize_id(raw_id)?;
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    let children = tx
        .execute("DELETE FROM qualifications WHERE employee_id = ?1", [&id])
        .context("failed to delete qualifications")?;
    let deleted = tx
        .execute("DELETE FROM employees WHERE id = ?1", [&id])
        .context("failed to delete employee row")?;

    if deleted == 0 {
        tx.rollback().context("failed to roll back delete")?;
        return Ok(false);
    }

    tx.commit().context("failed to commit delete")?;
    debug!(employee_id = %id, qualifications = children, "removed qualifications");
    Ok(true)
}

fn query_joined(conn: &Connection, id: Option<&str>) -> Result<Vec<JoinedRow>> {
    let sql = match id {
        Some(_) => format!("{SELECT_JOINED} WHERE e.id = ?1 {ORDER_NEWEST_FIRST}"),
        None => format!("{SELECT_JOINED} {ORDER_NEWEST_FIRST}"),
    };

    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare employee query")?;

    let mapped = match id {
        Some(id) => stmt.query_map([id], joined_from_row),
        None => stmt.query_map([], joined_from_row),
    };

    let rows = mapped
        .context("failed to load employees")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect employees")?;

    Ok(rows)
}

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<JoinedRow> {
    let employee = Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        designation: row.get(3)?,
        qualifications: Vec::new(),
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    };

    let qualification_id: Option<String> = row.get(6)?;
    let qualification = match qualification_id {
        Some(id) => Some(Qualification {
            id,
            institution: row.get(7)?,
            year_of_completion: row.get::<_, NaiveDate>(8)?,
            designation: row.get(9)?,
        }),
        None => None,
    };

    Ok(JoinedRow {
        employee,
        qualification,
    })
}

/// Fold joined rows into one employee per parent id, keeping the order in
/// which parents first appear. Child order within an employee is not
/// meaningful.
fn group_by_employee(rows: Vec<JoinedRow>) -> Vec<Employee> {
    let mut employees: Vec<Employee> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for JoinedRow {
        employee,
        qualification,
    } in rows
    {
        let slot = match positions.get(&employee.id) {
            Some(&slot) => slot,
            None => {
                positions.insert(employee.id.clone(), employees.len());
                employees.push(employee);
                employees.len() - 1
            }
        };

        if let Some(qualification) = qualification {
            employees[slot].qualifications.push(qualification);
        }
    }

    employees
}

/// Parse and canonicalize an employee id so lookups match the lowercase
/// hyphenated form the store writes.
fn normalize_id(raw: &str) -> Result<String> {
    let id = Uuid::parse_str(raw.trim())
        .with_context(|| format!("malformed employee id '{raw}'"))?;
    Ok(id.to_string())
}

fn is_missing_relation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<SqlError>()
            .is_some_and(|sql| sql.to_string().contains("no such table"))
    })
}

fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| SqlError::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
