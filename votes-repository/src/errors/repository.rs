//! Error types for the votes repository.
//! Defines specific errors that can occur during storage operations on
//! resources, sections and votes.
use thiserror::Error;

/// Represents errors that can occur within the votes repository.
///
/// `UniqueViolation` and `StaleWrite` are raised while committing a changeset
/// and always imply that the whole changeset was rolled back.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("A vote already exists for user {user_id} on resource {resource_id}")]
    UniqueViolation {
        user_id: uuid::Uuid,
        resource_id: uuid::Uuid,
    },

    #[error("Stale write: {0}")]
    StaleWrite(String),

    #[error("Counter out of range: {0}")]
    CounterOutOfRange(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Create a stale write error.
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::StaleWrite(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
