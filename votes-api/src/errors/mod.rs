//! Error types for the votes service binary.
//! Covers failures while starting up; request-level failures are `VoteError`s
//! rendered by the server module.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] votes_repository::RepositoryError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Tracing initialization failed: {0}")]
    Tracing(String),
}
