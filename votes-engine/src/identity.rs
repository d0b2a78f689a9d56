//! Resolution of the requesting user.
use votes_shared::types::UserId;

use crate::errors::VoteError;

/// Resolves the identity behind a request context (headers, session, token).
///
/// Implementations return `VoteError::Unauthenticated` when no user can be
/// resolved; the coordinator never accepts a user id from anywhere else.
pub trait IdentityProvider<C: ?Sized>: Send + Sync {
    fn current_user(&self, context: &C) -> Result<UserId, VoteError>;
}
