//! In-memory implementation of the votes repository.
//!
//! Backs local development and tests. A changeset is applied under a single
//! write lock with an undo log, so readers never observe a partial changeset
//! and a failing mutation restores everything applied before it.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use votes_shared::types::{
    Changeset, CounterUpdate, Resource, ResourceId, Section, SectionId, UserId, Vote, VoteCounts,
    VoteId, VoteKey, VoteMutation,
};

use crate::{RepositoryError, VotesRepository};

#[derive(Default)]
struct MemoryState {
    sections: HashMap<SectionId, Section>,
    resources: HashMap<ResourceId, Resource>,
    votes: HashMap<VoteId, Vote>,
    vote_index: HashMap<VoteKey, VoteId>,
}

enum Undo {
    RemoveVote(VoteId),
    RestoreVote(Vote),
    RestoreCounts(ResourceId, VoteCounts),
}

impl MemoryState {
    fn insert_vote(&mut self, vote: Vote) {
        self.vote_index.insert(vote.key(), vote.id);
        self.votes.insert(vote.id, vote);
    }

    fn remove_vote(&mut self, vote_id: VoteId) -> Option<Vote> {
        let vote = self.votes.remove(&vote_id)?;
        self.vote_index.remove(&vote.key());
        Some(vote)
    }

    fn apply_vote_mutation(
        &mut self,
        mutation: &VoteMutation,
        undo: &mut Vec<Undo>,
    ) -> Result<(), RepositoryError> {
        match mutation {
            VoteMutation::Insert(vote) => {
                if self.vote_index.contains_key(&vote.key()) {
                    return Err(RepositoryError::UniqueViolation {
                        user_id: vote.user_id,
                        resource_id: vote.resource_id,
                    });
                }
                self.insert_vote(vote.clone());
                undo.push(Undo::RemoveVote(vote.id));
            }
            VoteMutation::UpdateDirection { vote_id, direction } => {
                let vote = self
                    .votes
                    .get_mut(vote_id)
                    .ok_or_else(|| RepositoryError::stale(format!("vote {vote_id} no longer exists")))?;
                undo.push(Undo::RestoreVote(vote.clone()));
                vote.direction = *direction;
                vote.voted_at = chrono::Utc::now();
            }
            VoteMutation::Delete { vote_id } => {
                let vote = self
                    .remove_vote(*vote_id)
                    .ok_or_else(|| RepositoryError::stale(format!("vote {vote_id} no longer exists")))?;
                undo.push(Undo::RestoreVote(vote));
            }
        }
        Ok(())
    }

    fn apply_counter_update(
        &mut self,
        update: &CounterUpdate,
        undo: &mut Vec<Undo>,
    ) -> Result<(), RepositoryError> {
        if update.is_noop() {
            return Ok(());
        }
        let resource = self.resources.get_mut(&update.resource_id).ok_or_else(|| {
            RepositoryError::stale(format!("resource {} no longer exists", update.resource_id))
        })?;
        if resource.counts() != update.previous {
            return Err(RepositoryError::stale(format!(
                "counters of resource {} changed concurrently",
                update.resource_id
            )));
        }
        undo.push(Undo::RestoreCounts(update.resource_id, update.previous));
        resource.up_votes = update.current.up;
        resource.down_votes = update.current.down;
        Ok(())
    }

    fn apply(&mut self, changeset: &Changeset<'_>, undo: &mut Vec<Undo>) -> Result<(), RepositoryError> {
        for mutation in changeset.votes {
            self.apply_vote_mutation(mutation, undo)?;
        }
        for update in changeset.counters {
            self.apply_counter_update(update, undo)?;
        }
        Ok(())
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::RemoveVote(vote_id) => {
                    self.remove_vote(vote_id);
                }
                Undo::RestoreVote(vote) => {
                    self.remove_vote(vote.id);
                    self.insert_vote(vote);
                }
                Undo::RestoreCounts(resource_id, counts) => {
                    if let Some(resource) = self.resources.get_mut(&resource_id) {
                        resource.up_votes = counts.up;
                        resource.down_votes = counts.down;
                    }
                }
            }
        }
    }
}

/// In-memory votes repository guarded by a `tokio::sync::RwLock`.
///
/// Besides the `VotesRepository` contract it offers failure injection
/// (`fail_next_commits`) and latency injection (`set_commit_delay`,
/// `set_read_delay`, `set_ack_delay`) to exercise rollback and timeout paths.
#[derive(Default)]
pub struct InMemoryVotesRepository {
    state: RwLock<MemoryState>,
    failing_commits: AtomicUsize,
    commit_delay_ms: AtomicU64,
    read_delay_ms: AtomicU64,
    ack_delay_ms: AtomicU64,
}

fn saturating_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

async fn injected_delay(delay_ms: &AtomicU64) {
    let delay = delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

impl InMemoryVotesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `persist_changeset` fail without
    /// applying anything.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Delays every commit by `delay` before the write lock is taken.
    pub fn set_commit_delay(&self, delay: Duration) {
        self.commit_delay_ms
            .store(saturating_millis(delay), Ordering::SeqCst);
    }

    /// Delays the return of every successful commit by `delay`, after the
    /// changeset is applied.
    pub fn set_ack_delay(&self, delay: Duration) {
        self.ack_delay_ms
            .store(saturating_millis(delay), Ordering::SeqCst);
    }

    /// Delays `find_resource` and `find_vote` by `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(saturating_millis(delay), Ordering::SeqCst);
    }

    /// Returns every stored vote for the resource.
    pub async fn votes_for_resource(&self, resource_id: ResourceId) -> Vec<Vote> {
        let state = self.state.read().await;
        state
            .votes
            .values()
            .filter(|vote| vote.resource_id == resource_id)
            .cloned()
            .collect()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl VotesRepository for InMemoryVotesRepository {
    async fn find_resource(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError> {
        injected_delay(&self.read_delay_ms).await;
        Ok(self.state.read().await.resources.get(&id).cloned())
    }

    async fn find_section_by_name(&self, name: &str) -> Result<Option<Section>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.sections.values().find(|s| s.name == name).cloned())
    }

    async fn resources_in_section(
        &self,
        section_id: SectionId,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .values()
            .filter(|r| r.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn find_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, RepositoryError> {
        injected_delay(&self.read_delay_ms).await;
        let state = self.state.read().await;
        Ok(state
            .vote_index
            .get(&(user_id, resource_id))
            .and_then(|id| state.votes.get(id))
            .cloned())
    }

    async fn persist_changeset(&self, changeset: &Changeset<'_>) -> Result<(), RepositoryError> {
        injected_delay(&self.commit_delay_ms).await;
        if self.take_injected_failure() {
            return Err(RepositoryError::unavailable("injected commit failure"));
        }
        if changeset.is_empty() {
            return Ok(());
        }

        {
            let mut state = self.state.write().await;
            let mut undo = Vec::new();
            if let Err(e) = state.apply(changeset, &mut undo) {
                debug!(error = %e, undo_entries = undo.len(), "Rolling back changeset");
                state.rollback(undo);
                return Err(e);
            }
        }
        injected_delay(&self.ack_delay_ms).await;
        Ok(())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), RepositoryError> {
        self.state
            .write()
            .await
            .sections
            .insert(section.id, section.clone());
        Ok(())
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<(), RepositoryError> {
        self.state
            .write()
            .await
            .resources
            .insert(resource.id, resource.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use votes_shared::types::VoteDirection;

    async fn seeded() -> (InMemoryVotesRepository, Resource) {
        let repository = InMemoryVotesRepository::new();
        let section = Section::new("rust");
        let resource = Resource::new(section.id, "The Book", "https://doc.rust-lang.org/book", Uuid::new_v4());
        repository.insert_section(&section).await.unwrap();
        repository.insert_resource(&resource).await.unwrap();
        (repository, resource)
    }

    fn counter_update(resource: &Resource, up: u64, down: u64) -> CounterUpdate {
        CounterUpdate {
            resource_id: resource.id,
            previous: resource.counts(),
            current: VoteCounts::new(up, down),
        }
    }

    #[tokio::test]
    async fn test_persist_insert_and_counters() {
        let (repository, resource) = seeded().await;
        let vote = Vote::new(Uuid::new_v4(), resource.id, VoteDirection::Up);

        let votes = [VoteMutation::Insert(vote.clone())];
        let counters = [counter_update(&resource, 1, 0)];
        repository
            .persist_changeset(&Changeset { votes: &votes, counters: &counters })
            .await
            .unwrap();

        let stored = repository.find_vote(vote.user_id, resource.id).await.unwrap();
        assert_eq!(stored, Some(vote));
        let resource = repository.find_resource(resource.id).await.unwrap().unwrap();
        assert_eq!(resource.counts(), VoteCounts::new(1, 0));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rolls_back_everything() {
        let (repository, resource) = seeded().await;
        let user = Uuid::new_v4();
        let first = Vote::new(user, resource.id, VoteDirection::Up);
        let votes = [VoteMutation::Insert(first.clone())];
        let counters = [counter_update(&resource, 1, 0)];
        repository
            .persist_changeset(&Changeset { votes: &votes, counters: &counters })
            .await
            .unwrap();

        let resource = repository.find_resource(resource.id).await.unwrap().unwrap();
        let second = Vote::new(user, resource.id, VoteDirection::Down);
        let votes = [VoteMutation::Insert(second)];
        let counters = [counter_update(&resource, 1, 1)];
        let result = repository
            .persist_changeset(&Changeset { votes: &votes, counters: &counters })
            .await;

        assert!(matches!(result, Err(RepositoryError::UniqueViolation { .. })));
        let after = repository.find_resource(resource.id).await.unwrap().unwrap();
        assert_eq!(after.counts(), VoteCounts::new(1, 0));
        assert_eq!(repository.votes_for_resource(resource.id).await, vec![first]);
    }

    #[tokio::test]
    async fn test_stale_counters_undo_vote_mutation() {
        let (repository, resource) = seeded().await;
        let vote = Vote::new(Uuid::new_v4(), resource.id, VoteDirection::Up);
        let votes = [VoteMutation::Insert(vote.clone())];
        let stale = CounterUpdate {
            resource_id: resource.id,
            previous: VoteCounts::new(5, 5),
            current: VoteCounts::new(6, 5),
        };

        let result = repository
            .persist_changeset(&Changeset { votes: &votes, counters: &[stale] })
            .await;

        assert!(matches!(result, Err(RepositoryError::StaleWrite(_))));
        assert!(repository.find_vote(vote.user_id, resource.id).await.unwrap().is_none());
        let after = repository.find_resource(resource.id).await.unwrap().unwrap();
        assert_eq!(after.counts(), VoteCounts::default());
    }

    #[tokio::test]
    async fn test_delete_then_failed_counter_restores_vote() {
        let (repository, resource) = seeded().await;
        let vote = Vote::new(Uuid::new_v4(), resource.id, VoteDirection::Down);
        let votes = [VoteMutation::Insert(vote.clone())];
        let counters = [counter_update(&resource, 0, 1)];
        repository
            .persist_changeset(&Changeset { votes: &votes, counters: &counters })
            .await
            .unwrap();

        let votes = [VoteMutation::Delete { vote_id: vote.id }];
        let counters = [CounterUpdate {
            resource_id: resource.id,
            previous: VoteCounts::new(3, 3),
            current: VoteCounts::new(3, 2),
        }];
        let result = repository
            .persist_changeset(&Changeset { votes: &votes, counters: &counters })
            .await;

        assert!(result.is_err());
        assert_eq!(repository.find_vote(vote.user_id, resource.id).await.unwrap(), Some(vote));
    }

    #[tokio::test]
    async fn test_injected_failure_applies_nothing() {
        let (repository, resource) = seeded().await;
        repository.fail_next_commits(1);
        let vote = Vote::new(Uuid::new_v4(), resource.id, VoteDirection::Up);
        let votes = [VoteMutation::Insert(vote.clone())];
        let counters = [counter_update(&resource, 1, 0)];
        let changeset = Changeset { votes: &votes, counters: &counters };

        let result = repository.persist_changeset(&changeset).await;
        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
        assert!(repository.find_vote(vote.user_id, resource.id).await.unwrap().is_none());

        repository.persist_changeset(&changeset).await.unwrap();
        assert!(repository.find_vote(vote.user_id, resource.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_section_lookup_by_name() {
        let (repository, resource) = seeded().await;
        let section = repository.find_section_by_name("rust").await.unwrap().unwrap();
        assert_eq!(section.id, resource.section_id);
        assert!(repository.find_section_by_name("go").await.unwrap().is_none());

        let resources = repository.resources_in_section(section.id).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert!(repository.resources_in_section(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_delays_saturate() {
        let (repository, resource) = seeded().await;
        repository.set_read_delay(Duration::MAX);
        assert_eq!(repository.read_delay_ms.load(Ordering::SeqCst), u64::MAX);

        let lookup = tokio::time::timeout(Duration::from_secs(60), repository.find_resource(resource.id)).await;
        assert!(lookup.is_err());

        repository.set_read_delay(Duration::ZERO);
        repository.set_commit_delay(Duration::from_secs(u64::MAX));
        assert_eq!(repository.commit_delay_ms.load(Ordering::SeqCst), u64::MAX);
        assert!(repository.find_resource(resource.id).await.unwrap().is_some());
    }
}
