use axum::http::HeaderMap;
use uuid::Uuid;
use votes_engine::{IdentityProvider, VoteError};
use votes_shared::types::UserId;

/// Header carrying the authenticated user's id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the requesting user from the `x-user-id` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentityProvider;

impl IdentityProvider<HeaderMap> for HeaderIdentityProvider {
    fn current_user(&self, headers: &HeaderMap) -> Result<UserId, VoteError> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(VoteError::Unauthenticated)
    }
}
