use thiserror::Error;

/// Failures surfaced by the record store. Each variant names the operation
/// that failed and carries the annotated cause chain from the helper that
/// ran the query.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Catalog lookup or DDL failed while bootstrapping the schema.
    #[error("failed to ensure tables exist")]
    Schema(#[source] anyhow::Error),

    #[error("failed to fetch employees")]
    Fetch(#[source] anyhow::Error),

    /// The insert transaction was rolled back.
    #[error("failed to create employee")]
    Create(#[source] anyhow::Error),

    /// The delete transaction was rolled back.
    #[error("failed to delete employee")]
    Delete(#[source] anyhow::Error),

    #[error("employee {id} not found")]
    NotFound { id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
