use serde::{Deserialize, Serialize};

use crate::types::{Resource, ResourceId, UserId};

/// A resource together with its computed popularity score, as returned by the
/// top-N ranking query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedResource {
    pub id: ResourceId,
    pub name: String,
    pub url: String,
    pub up_votes: u64,
    pub down_votes: u64,
    pub total_votes: u64,
    pub score: f64,
    pub owner: UserId,
}

impl RankedResource {
    pub fn from_resource(resource: &Resource, score: f64) -> Self {
        Self {
            id: resource.id,
            name: resource.name.clone(),
            url: resource.url.clone(),
            up_votes: resource.up_votes,
            down_votes: resource.down_votes,
            total_votes: resource.total_votes(),
            score,
            owner: resource.owner,
        }
    }
}
