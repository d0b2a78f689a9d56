use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ResourceId, UserId, VoteDirection, VoteId, VoteKey};

/// Represents a user's vote on a resource.
///
/// At most one `Vote` exists per (user, resource) pair. Its direction is
/// mutated in place when the user changes their mind and the record is deleted
/// when the vote is retracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub user_id: UserId,
    pub resource_id: ResourceId,
    pub direction: VoteDirection,
    pub voted_at: DateTime<Utc>,
}

impl Vote {
    /// Creates a fresh vote record with a random id, stamped now.
    pub fn new(user_id: UserId, resource_id: ResourceId, direction: VoteDirection) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            resource_id,
            direction,
            voted_at: Utc::now(),
        }
    }

    pub fn key(&self) -> VoteKey {
        (self.user_id, self.resource_id)
    }
}
