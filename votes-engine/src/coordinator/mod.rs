//! This module contains the `VoteCoordinator`, the single entry point for
//! mutating a user's vote on a resource.
//!
//! Every mutation follows the same steps under the resource's lock: load the
//! resource and the user's current vote, plan the state transition, stage the
//! vote mutation and the counter updates into one unit of work, then commit it.
use std::sync::Arc;

use tracing::{debug, info, warn};
use votes_repository::VotesRepository;
use votes_shared::types::{
    Resource, ResourceId, UserId, Vote, VoteCounts, VoteDirection, VoteState,
};

use crate::config::EngineConfig;
use crate::errors::VoteError;
use crate::locks::ResourceLocks;
use crate::store::{UnitOfWork, VoteStore};

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRequest {
    Create(VoteDirection),
    Change(VoteDirection),
    Remove,
}

/// What has to happen to the vote record and the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Insert(VoteDirection),
    Flip {
        from: VoteDirection,
        to: VoteDirection,
    },
    Keep,
    Delete(VoteDirection),
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    /// The vote as it now stands, `None` after a removal.
    pub vote: Option<Vote>,
    /// The resource's counters after the commit.
    pub counts: VoteCounts,
}

/// Maps the current state and a request onto a transition, or rejects it.
pub fn plan_transition(
    state: VoteState,
    request: VoteRequest,
    user_id: UserId,
    resource_id: ResourceId,
) -> Result<Transition, VoteError> {
    let not_found = || VoteError::VoteNotFound {
        user_id,
        resource_id,
    };

    match (state, request) {
        (VoteState::NoVote, VoteRequest::Create(dir)) => Ok(Transition::Insert(dir)),
        (_, VoteRequest::Create(_)) => Err(VoteError::Conflict {
            user_id,
            resource_id,
        }),
        (VoteState::NoVote, _) => Err(not_found()),
        (VoteState::Upvoted, VoteRequest::Change(VoteDirection::Up))
        | (VoteState::Downvoted, VoteRequest::Change(VoteDirection::Down)) => Ok(Transition::Keep),
        (VoteState::Upvoted, VoteRequest::Change(to)) => Ok(Transition::Flip {
            from: VoteDirection::Up,
            to,
        }),
        (VoteState::Downvoted, VoteRequest::Change(to)) => Ok(Transition::Flip {
            from: VoteDirection::Down,
            to,
        }),
        (VoteState::Upvoted, VoteRequest::Remove) => Ok(Transition::Delete(VoteDirection::Up)),
        (VoteState::Downvoted, VoteRequest::Remove) => Ok(Transition::Delete(VoteDirection::Down)),
    }
}

pub struct VoteCoordinator {
    repository: Arc<dyn VotesRepository>,
    store: VoteStore,
    locks: ResourceLocks,
    config: EngineConfig,
}

impl VoteCoordinator {
    pub fn new(repository: Arc<dyn VotesRepository>, config: EngineConfig) -> Self {
        Self {
            store: VoteStore::new(repository.clone()),
            repository,
            locks: ResourceLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the user's current vote on the resource.
    pub async fn get_vote(&self, user_id: UserId, resource_id: ResourceId) -> Result<Vote, VoteError> {
        self.store
            .get(user_id, resource_id)
            .await?
            .ok_or(VoteError::VoteNotFound {
                user_id,
                resource_id,
            })
    }

    /// Records the user's first vote on the resource.
    pub async fn create_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, VoteError> {
        self.execute(user_id, resource_id, VoteRequest::Create(direction))
            .await
    }

    /// Changes the direction of the user's existing vote. Asking for the
    /// current direction changes nothing.
    pub async fn change_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, VoteError> {
        self.execute(user_id, resource_id, VoteRequest::Change(direction))
            .await
    }

    /// Retracts the user's vote.
    pub async fn remove_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<VoteReceipt, VoteError> {
        self.execute(user_id, resource_id, VoteRequest::Remove).await
    }

    /// Runs one request as a unit of work bounded by `commit_timeout`.
    ///
    /// The bound covers waiting for the resource lock, the reads and the
    /// commit. On expiry the future is dropped: the lock is released, and an
    /// open Postgres transaction is rolled back with its connection. If the
    /// bound fires after COMMIT already reached the database, the caller sees
    /// `PersistenceFailure` although the vote was stored; a retried create
    /// then answers `Conflict` and `get_vote` shows the stored vote.
    async fn execute(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        request: VoteRequest,
    ) -> Result<VoteReceipt, VoteError> {
        let timeout = self.config.commit_timeout;
        match tokio::time::timeout(timeout, self.run(user_id, resource_id, request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%user_id, %resource_id, ?request, timeout_ms = timeout.as_millis(), "Vote request timed out");
                Err(VoteError::persistence(format!(
                    "vote request timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }

    async fn run(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        request: VoteRequest,
    ) -> Result<VoteReceipt, VoteError> {
        let _guard = self.locks.acquire(resource_id).await;

        let Some(resource) = self.repository.find_resource(resource_id).await? else {
            debug!(%user_id, %resource_id, ?request, "Rejected vote on unknown resource");
            return Err(VoteError::ResourceNotFound(resource_id));
        };
        let current = self.store.get(user_id, resource_id).await?;
        let state = VoteState::of(current.as_ref());
        let transition = plan_transition(state, request, user_id, resource_id).inspect_err(|e| {
            debug!(%user_id, %resource_id, ?state, ?request, error = %e, "Rejected vote request");
        })?;

        let mut uow = UnitOfWork::new();
        let vote = self.stage(&mut uow, &resource, user_id, current, transition)?;
        let counts = uow.ledger().counts(resource_id).unwrap_or_else(|| resource.counts());

        if transition == Transition::Keep {
            debug!(%user_id, %resource_id, "Vote direction unchanged, nothing to commit");
            return Ok(VoteReceipt { vote, counts });
        }

        if let Err(e) = uow.commit(self.repository.as_ref()).await {
            warn!(%user_id, %resource_id, ?request, error = %e, "Vote commit failed");
            return Err(e);
        }

        info!(
            %user_id,
            %resource_id,
            ?transition,
            up_votes = counts.up,
            down_votes = counts.down,
            "Vote committed"
        );
        Ok(VoteReceipt { vote, counts })
    }

    fn stage(
        &self,
        uow: &mut UnitOfWork,
        resource: &Resource,
        user_id: UserId,
        current: Option<Vote>,
        transition: Transition,
    ) -> Result<Option<Vote>, VoteError> {
        uow.ledger_mut().track(resource);

        let vote = match (transition, current) {
            (Transition::Insert(dir), _) => {
                let vote = self.store.stage_insert(uow, user_id, resource.id, dir);
                uow.ledger_mut().increment(resource.id, dir)?;
                Some(vote)
            }
            (Transition::Flip { from, to }, Some(current)) => {
                let vote = self.store.stage_change_direction(uow, &current, to);
                uow.ledger_mut().decrement(resource.id, from)?;
                uow.ledger_mut().increment(resource.id, to)?;
                Some(vote)
            }
            (Transition::Delete(dir), Some(current)) => {
                self.store.stage_delete(uow, &current);
                uow.ledger_mut().decrement(resource.id, dir)?;
                None
            }
            (Transition::Keep, current) => current,
            (_, None) => {
                return Err(VoteError::VoteNotFound {
                    user_id,
                    resource_id: resource.id,
                });
            }
        };
        Ok(vote)
    }
}
