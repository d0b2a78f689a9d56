use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ResourceId, SectionId, UserId};

/// Aggregated vote counts for a resource.
///
/// This is the denormalized view of all votes on the resource: `up` must equal
/// the number of up votes and `down` the number of down votes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCounts {
    pub up: u64,
    pub down: u64,
}

impl VoteCounts {
    pub fn new(up: u64, down: u64) -> Self {
        Self { up, down }
    }

    pub fn total(&self) -> u64 {
        self.up.saturating_add(self.down)
    }
}

/// A link that can be voted on and ranked within its section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub section_id: SectionId,
    pub name: String,
    pub url: String,
    pub owner: UserId,
    pub up_votes: u64,
    pub down_votes: u64,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Creates a resource with zeroed counters, stamped now.
    pub fn new(
        section_id: SectionId,
        name: impl Into<String>,
        url: impl Into<String>,
        owner: UserId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            section_id,
            name: name.into(),
            url: url.into(),
            owner,
            up_votes: 0,
            down_votes: 0,
            created_at: Utc::now(),
        }
    }

    pub fn counts(&self) -> VoteCounts {
        VoteCounts::new(self.up_votes, self.down_votes)
    }

    pub fn total_votes(&self) -> u64 {
        self.counts().total()
    }
}
