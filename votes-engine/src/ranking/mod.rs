//! Read path: the highest scoring resources of a section.
use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;
use votes_repository::VotesRepository;
use votes_shared::types::{RankedResource, Resource};

use crate::errors::VoteError;
use crate::score::ScoreEngine;

/// Ranks the resources of a section. Takes no locks, so concurrent writes may
/// or may not be reflected in a given result.
#[derive(Clone)]
pub struct RankingQuery {
    repository: Arc<dyn VotesRepository>,
    score_engine: ScoreEngine,
}

impl RankingQuery {
    pub fn new(repository: Arc<dyn VotesRepository>, score_engine: ScoreEngine) -> Self {
        Self {
            repository,
            score_engine,
        }
    }

    /// Returns at most `n` resources of the section called `section_name`,
    /// best first. An unknown section yields an empty list.
    pub async fn top_n(&self, section_name: &str, n: usize) -> Result<Vec<RankedResource>, VoteError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let Some(section) = self.repository.find_section_by_name(section_name).await? else {
            debug!(section = section_name, "Unknown section, nothing to rank");
            return Ok(Vec::new());
        };

        let resources = self.repository.resources_in_section(section.id).await?;
        Ok(rank(&self.score_engine, resources, n))
    }
}

/// Sorts by score descending, then newest first, then id ascending, and keeps
/// the first `n`.
pub fn rank(score_engine: &ScoreEngine, resources: Vec<Resource>, n: usize) -> Vec<RankedResource> {
    let mut scored: Vec<(f64, Resource)> = resources
        .into_iter()
        .map(|r| (score_engine.score(r.up_votes, r.down_votes), r))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| compare(*score_a, a, *score_b, b));
    scored.truncate(n);

    scored
        .iter()
        .map(|(score, resource)| RankedResource::from_resource(resource, *score))
        .collect()
}

fn compare(score_a: f64, a: &Resource, score_b: f64, b: &Resource) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
