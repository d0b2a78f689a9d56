//! End-to-end tests of the voting engine against the in-memory repository.

use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;
use votes_engine::{EngineConfig, RankingQuery, ScoreEngine, VoteCoordinator, VoteError};
use votes_repository::{InMemoryVotesRepository, VotesRepository};
use votes_shared::types::{Resource, Section, VoteCounts, VoteDirection};

struct Fixture {
    repository: Arc<InMemoryVotesRepository>,
    coordinator: Arc<VoteCoordinator>,
    section: Section,
}

impl Fixture {
    async fn new() -> Self {
        let repository = Arc::new(InMemoryVotesRepository::new());
        let section = Section::new("frameworks");
        repository.insert_section(&section).await.unwrap();
        let coordinator = Arc::new(VoteCoordinator::new(repository.clone(), EngineConfig::default()));
        Self {
            repository,
            coordinator,
            section,
        }
    }

    async fn add_resource(&self, name: &str) -> Resource {
        let resource = Resource::new(self.section.id, name, format!("https://{name}.rs"), Uuid::new_v4());
        self.repository.insert_resource(&resource).await.unwrap();
        resource
    }

    async fn counts(&self, resource: &Resource) -> VoteCounts {
        self.repository
            .find_resource(resource.id)
            .await
            .unwrap()
            .unwrap()
            .counts()
    }

    /// Counters recomputed from the stored vote records.
    async fn tallied(&self, resource: &Resource) -> VoteCounts {
        let votes = self.repository.votes_for_resource(resource.id).await;
        let up = votes.iter().filter(|v| v.direction.is_up()).count() as u64;
        VoteCounts::new(up, votes.len() as u64 - up)
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_up_change_remove_lifecycle() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("axum").await;
    let user = Uuid::new_v4();
    let coordinator = &fixture.coordinator;

    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(0, 0));

    let receipt = coordinator.create_vote(user, resource.id, VoteDirection::Up).await.unwrap();
    assert_eq!(receipt.counts, VoteCounts::new(1, 0));
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(1, 0));

    let receipt = coordinator.change_vote(user, resource.id, VoteDirection::Down).await.unwrap();
    assert_eq!(receipt.counts, VoteCounts::new(0, 1));
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(0, 1));
    let vote = coordinator.get_vote(user, resource.id).await.unwrap();
    assert_eq!(vote.direction, VoteDirection::Down);

    let receipt = coordinator.remove_vote(user, resource.id).await.unwrap();
    assert!(receipt.vote.is_none());
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(0, 0));
    assert!(matches!(
        coordinator.get_vote(user, resource.id).await,
        Err(VoteError::VoteNotFound { .. })
    ));
}

#[tokio::test]
async fn test_second_create_conflicts_and_keeps_counters() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("tokio").await;
    let user = Uuid::new_v4();

    fixture.coordinator.create_vote(user, resource.id, VoteDirection::Up).await.unwrap();
    let result = fixture.coordinator.create_vote(user, resource.id, VoteDirection::Down).await;

    assert!(matches!(result, Err(VoteError::Conflict { user_id, .. }) if user_id == user));
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(1, 0));
}

#[tokio::test]
async fn test_votes_of_other_users_are_independent() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("serde").await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    fixture.coordinator.create_vote(alice, resource.id, VoteDirection::Up).await.unwrap();
    fixture.coordinator.create_vote(bob, resource.id, VoteDirection::Down).await.unwrap();
    fixture.coordinator.remove_vote(alice, resource.id).await.unwrap();

    assert!(fixture.coordinator.get_vote(bob, resource.id).await.is_ok());
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(0, 1));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_yield_one_success_one_conflict() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("rayon").await;
    let resource_id = resource.id;
    let user = Uuid::new_v4();

    let first = {
        let coordinator = fixture.coordinator.clone();
        tokio::spawn(async move { coordinator.create_vote(user, resource_id, VoteDirection::Up).await })
    };
    let second = {
        let coordinator = fixture.coordinator.clone();
        tokio::spawn(async move { coordinator.create_vote(user, resource_id, VoteDirection::Up).await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(VoteError::Conflict { .. })))
            .count(),
        1
    );
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(1, 0));
    assert_eq!(fixture.repository.votes_for_resource(resource.id).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_users_voting_concurrently_keep_counters_consistent() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("hyper").await;
    let resource_id = resource.id;

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let coordinator = fixture.coordinator.clone();
            let direction = VoteDirection::from_bool(i % 3 != 0);
            tokio::spawn(async move {
                coordinator.create_vote(Uuid::new_v4(), resource_id, direction).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counts = fixture.counts(&resource).await;
    assert_eq!(counts.total(), 40);
    assert_eq!(counts, fixture.tallied(&resource).await);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_commit_leaves_state_unchanged() {
    let fixture = Fixture::new().await;
    let resource = fixture.add_resource("clap").await;
    let user = Uuid::new_v4();
    fixture.coordinator.create_vote(user, resource.id, VoteDirection::Up).await.unwrap();

    fixture.repository.fail_next_commits(2);
    let change = fixture.coordinator.change_vote(user, resource.id, VoteDirection::Down).await;
    let remove = fixture.coordinator.remove_vote(user, resource.id).await;

    assert!(matches!(change, Err(VoteError::PersistenceFailure(_))));
    assert!(matches!(remove, Err(VoteError::PersistenceFailure(_))));
    assert_eq!(fixture.counts(&resource).await, VoteCounts::new(1, 0));
    let vote = fixture.coordinator.get_vote(user, resource.id).await.unwrap();
    assert_eq!(vote.direction, VoteDirection::Up);
}

// ============================================================================
// Ranking Tests
// ============================================================================

#[tokio::test]
async fn test_top_n_ranks_section_after_voting() {
    let fixture = Fixture::new().await;
    let popular = fixture.add_resource("bevy").await;
    let mixed = fixture.add_resource("leptos").await;
    let quiet = fixture.add_resource("yew").await;

    for _ in 0..12 {
        fixture.coordinator.create_vote(Uuid::new_v4(), popular.id, VoteDirection::Up).await.unwrap();
    }
    for i in 0..12 {
        let direction = VoteDirection::from_bool(i % 2 == 0);
        fixture.coordinator.create_vote(Uuid::new_v4(), mixed.id, direction).await.unwrap();
    }
    fixture.coordinator.create_vote(Uuid::new_v4(), quiet.id, VoteDirection::Up).await.unwrap();

    let ranking = RankingQuery::new(fixture.repository.clone(), ScoreEngine::default());
    let top = ranking.top_n("frameworks", 5).await.unwrap();

    let ids: Vec<_> = top.iter().map(|r| r.id).collect();
    assert_eq!(ids, [popular.id, mixed.id, quiet.id]);
    assert_eq!(top[0].up_votes, 12);
    assert_eq!(top[2].score, 0.0);

    assert_eq!(ranking.top_n("frameworks", 1).await.unwrap().len(), 1);
    assert!(ranking.top_n("frameworks", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_top_n_of_unknown_or_empty_section_is_empty() {
    let fixture = Fixture::new().await;
    let empty = Section::new("empty-section");
    fixture.repository.insert_section(&empty).await.unwrap();
    let ranking = RankingQuery::new(fixture.repository.clone(), ScoreEngine::default());

    assert!(ranking.top_n("empty-section", 5).await.unwrap().is_empty());
    assert!(ranking.top_n("no-such-section", 5).await.unwrap().is_empty());
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Create(usize, bool),
    Change(usize, bool),
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, any::<bool>()).prop_map(|(u, up)| Op::Create(u, up)),
        (0..4usize, any::<bool>()).prop_map(|(u, up)| Op::Change(u, up)),
        (0..4usize).prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_counters_match_votes_after_any_sequence(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let fixture = Fixture::new().await;
            let resource = fixture.add_resource("proptest").await;
            let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

            for op in ops {
                let result = match op {
                    Op::Create(u, up) => fixture.coordinator.create_vote(users[u], resource.id, VoteDirection::from_bool(up)).await,
                    Op::Change(u, up) => fixture.coordinator.change_vote(users[u], resource.id, VoteDirection::from_bool(up)).await,
                    Op::Remove(u) => fixture.coordinator.remove_vote(users[u], resource.id).await,
                };
                assert!(matches!(
                    result,
                    Ok(_) | Err(VoteError::Conflict { .. }) | Err(VoteError::VoteNotFound { .. })
                ));

                let votes = fixture.repository.votes_for_resource(resource.id).await;
                let mut voters: Vec<_> = votes.iter().map(|v| v.user_id).collect();
                voters.sort();
                voters.dedup();
                assert_eq!(voters.len(), votes.len());
                assert_eq!(fixture.counts(&resource).await, fixture.tallied(&resource).await);
            }
        });
    }
}
