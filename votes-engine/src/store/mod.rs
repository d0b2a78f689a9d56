//! This module defines the `VoteStore`, the owner of individual vote records,
//! and the `UnitOfWork` its mutations are staged into.
//!
//! Mutations never reach the repository directly: they are staged and then
//! committed together with the counter updates of the same request.
use std::sync::Arc;

use votes_repository::VotesRepository;
use votes_shared::types::{
    Changeset, ResourceId, UserId, Vote, VoteDirection, VoteMutation,
};

use crate::errors::VoteError;
use crate::ledger::CounterLedger;

/// The staged vote mutations and counter updates of one request.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    votes: Vec<VoteMutation>,
    ledger: CounterLedger,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &CounterLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CounterLedger {
        &mut self.ledger
    }

    pub fn changeset(&self) -> Changeset<'_> {
        Changeset {
            votes: &self.votes,
            counters: self.ledger.updates(),
        }
    }

    /// Commits the unit of work through `repository`, which applies the
    /// changeset atomically. Bounding the call is up to the caller.
    pub async fn commit(self, repository: &dyn VotesRepository) -> Result<(), VoteError> {
        repository
            .persist_changeset(&self.changeset())
            .await
            .map_err(VoteError::from)
    }
}

/// Owns the vote records: reads them and stages their mutations.
///
/// Staging methods are crate-private so that only the coordinator, which holds
/// the per-resource lock, can change a vote.
#[derive(Clone)]
pub struct VoteStore {
    repository: Arc<dyn VotesRepository>,
}

impl VoteStore {
    pub fn new(repository: Arc<dyn VotesRepository>) -> Self {
        Self { repository }
    }

    /// Returns the user's current vote on the resource, if any.
    pub async fn get(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, VoteError> {
        Ok(self.repository.find_vote(user_id, resource_id).await?)
    }

    pub(crate) fn stage_insert(
        &self,
        uow: &mut UnitOfWork,
        user_id: UserId,
        resource_id: ResourceId,
        direction: VoteDirection,
    ) -> Vote {
        let vote = Vote::new(user_id, resource_id, direction);
        uow.votes.push(VoteMutation::Insert(vote.clone()));
        vote
    }

    pub(crate) fn stage_change_direction(
        &self,
        uow: &mut UnitOfWork,
        vote: &Vote,
        direction: VoteDirection,
    ) -> Vote {
        uow.votes.push(VoteMutation::UpdateDirection {
            vote_id: vote.id,
            direction,
        });
        Vote {
            direction,
            voted_at: chrono::Utc::now(),
            ..vote.clone()
        }
    }

    pub(crate) fn stage_delete(&self, uow: &mut UnitOfWork, vote: &Vote) {
        uow.votes.push(VoteMutation::Delete { vote_id: vote.id });
    }
}
