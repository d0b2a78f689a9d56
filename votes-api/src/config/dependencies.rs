use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use uuid::Uuid;
use votes_engine::{RankingQuery, ScoreEngine, VoteCoordinator};
use votes_repository::{InMemoryVotesRepository, PostgresVotesRepository, VotesRepository};
use votes_shared::types::{Resource, Section};

use crate::config::Settings;
use crate::errors::ApiError;

/// Section seeded into the in-memory backend so a local instance has
/// something to vote on.
pub const DEMO_SECTION: &str = "general";

/// `Dependencies` holds the components the HTTP handlers are built on.
///
/// Both the coordinator and the ranking query share one repository, either
/// PostgreSQL or in-memory.
pub struct Dependencies {
    pub repository: Arc<dyn VotesRepository>,
    pub coordinator: Arc<VoteCoordinator>,
    pub ranking: RankingQuery,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// Connects to PostgreSQL and applies migrations when `DATABASE_URL` is
    /// set, otherwise falls back to a seeded in-memory repository.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or an
    /// `ApiError` if the database cannot be reached or migrated.
    pub async fn new(settings: &Settings) -> Result<Self, ApiError> {
        let repository: Arc<dyn VotesRepository> = match &settings.database_url {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .acquire_timeout(settings.engine.commit_timeout)
                    .connect(database_url)
                    .await?;
                let repository = PostgresVotesRepository::new(pool).await?;
                repository.migrate().await?;
                info!("Using PostgreSQL votes repository");
                Arc::new(repository)
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory votes repository");
                let repository = InMemoryVotesRepository::new();
                seed_demo_data(&repository).await?;
                Arc::new(repository)
            }
        };

        Ok(Self::from_repository(repository, settings))
    }

    /// Wires the engine on top of an already constructed repository.
    pub fn from_repository(repository: Arc<dyn VotesRepository>, settings: &Settings) -> Self {
        let coordinator = Arc::new(VoteCoordinator::new(repository.clone(), settings.engine));
        let ranking = RankingQuery::new(
            repository.clone(),
            ScoreEngine::new(settings.engine.min_sample_size),
        );

        Self {
            repository,
            coordinator,
            ranking,
        }
    }
}

async fn seed_demo_data(repository: &dyn VotesRepository) -> Result<(), ApiError> {
    let section = Section::new(DEMO_SECTION);
    repository.insert_section(&section).await?;

    let owner = Uuid::new_v4();
    for (name, url) in [
        ("The Rust Programming Language", "https://doc.rust-lang.org/book/"),
        ("Rust by Example", "https://doc.rust-lang.org/rust-by-example/"),
        ("Asynchronous Programming in Rust", "https://rust-lang.github.io/async-book/"),
    ] {
        let resource = Resource::new(section.id, name, url, owner);
        info!(resource_id = %resource.id, name, "Seeded demo resource");
        repository.insert_resource(&resource).await?;
    }
    Ok(())
}
