//! Persistence module split across logical submodules.

mod connection;
mod employees;
mod error;
mod schema;

pub use connection::{open_database, open_in_memory};
pub use employees::{create_employee, delete_employee, get_employee, list_employees};
pub use error::{StoreError, StoreResult};
pub use schema::ensure_schema;
