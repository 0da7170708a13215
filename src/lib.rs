//! Employee directory: a SQLite-backed record store for employees and their
//! qualifications, a validation gate for new records, and a terminal UI.
pub mod config;
pub mod db;
pub mod directory;
pub mod logging;
pub mod models;
pub mod ui;
pub mod validation;

/// Store operations and bootstrap helpers used by `main.rs` and the UI.
pub use db::{
    create_employee, delete_employee, ensure_schema, get_employee, list_employees, open_database,
    open_in_memory, StoreError, StoreResult,
};

pub use config::Config;
pub use directory::{filter_and_sort, SortOption};
pub use logging::init_logging;
pub use models::{Employee, NewEmployee, NewQualification, Qualification, Role};
pub use validation::{validate, EmployeeDraft, QualificationDraft, ValidationError};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
