//! Error types returned by the vote coordinator and the ranking query.
use thiserror::Error;
use votes_repository::RepositoryError;
use votes_shared::types::{ResourceId, UserId};

/// Represents every distinguishable outcome of a failed voting request.
///
/// Validation failures are detected before anything is staged. Only
/// `PersistenceFailure` can happen after staging. It normally means the
/// changeset was rolled back. The exception is a timeout that fires after the
/// database accepted COMMIT: the vote is stored, and a retried create answers
/// `Conflict`.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Resource {0} was not found")]
    ResourceNotFound(ResourceId),

    #[error("Vote not found for user {user_id} on resource {resource_id}")]
    VoteNotFound {
        user_id: UserId,
        resource_id: ResourceId,
    },

    #[error("User {user_id} has already voted on resource {resource_id}")]
    Conflict {
        user_id: UserId,
        resource_id: ResourceId,
    },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl VoteError {
    /// Create a persistence failure.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

impl From<RepositoryError> for VoteError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation {
                user_id,
                resource_id,
            } => Self::Conflict {
                user_id,
                resource_id,
            },
            other => Self::PersistenceFailure(other.to_string()),
        }
    }
}
