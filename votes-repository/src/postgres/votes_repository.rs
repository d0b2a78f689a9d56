//! PostgreSQL implementation of the votes repository.
//!
//! Provides a PostgreSQL backend for the `VotesRepository` trait with
//! connection pooling and transactional changesets.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - One transaction per changeset, rolled back on any failure
//! - Compare-and-set counter updates to detect writers in other processes
//! - `UNIQUE (user_id, resource_id)` as the last line of the one-vote rule
//!
//! ## Database Tables
//!
//! - `sections`: Named groupings of resources
//! - `resources`: Links with their denormalized `up_votes` / `down_votes`
//! - `votes`: One row per (user, resource) pair
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::debug;
use uuid::Uuid;
use votes_shared::types::{
    Changeset, CounterUpdate, Resource, ResourceId, Section, SectionId, UserId, Vote,
    VoteDirection, VoteMutation,
};

use crate::{RepositoryError, VotesRepository};

const RESOURCE_COLUMNS: &str =
    "id, section_id, name, url, owner_id, up_votes, down_votes, created_at";

/// PostgreSQL implementation of the votes repository.
///
/// All reads go straight to the pool; `persist_changeset` opens a transaction
/// and commits it only after every statement affected the expected rows.
pub struct PostgresVotesRepository {
    pool: sqlx::PgPool,
}

impl PostgresVotesRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RepositoryError> {
        Ok(Self { pool })
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("src/postgres/migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Applies a single vote mutation within an active transaction.
    ///
    /// Updates and deletes that touch no row mean the vote vanished after the
    /// coordinator read it, which is reported as a stale write.
    async fn apply_vote_mutation_tx(
        &self,
        mutation: &VoteMutation,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), RepositoryError> {
        match mutation {
            VoteMutation::Insert(vote) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO votes (id, user_id, resource_id, direction, voted_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(vote.id)
                .bind(vote.user_id)
                .bind(vote.resource_id)
                .bind(vote.direction.is_up())
                .bind(vote.voted_at)
                .execute(&mut **tx)
                .await;

                match result {
                    Ok(_) => Ok(()),
                    Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                        Err(RepositoryError::UniqueViolation {
                            user_id: vote.user_id,
                            resource_id: vote.resource_id,
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            VoteMutation::UpdateDirection { vote_id, direction } => {
                let result = sqlx::query(
                    "UPDATE votes SET direction = $2, voted_at = now() WHERE id = $1",
                )
                .bind(vote_id)
                .bind(direction.is_up())
                .execute(&mut **tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::stale(format!("vote {vote_id} no longer exists")));
                }
                Ok(())
            }
            VoteMutation::Delete { vote_id } => {
                let result = sqlx::query("DELETE FROM votes WHERE id = $1")
                    .bind(vote_id)
                    .execute(&mut **tx)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::stale(format!("vote {vote_id} no longer exists")));
                }
                Ok(())
            }
        }
    }

    /// Writes new counter values within an active transaction.
    ///
    /// The `WHERE` clause pins the previous values so a concurrent update from
    /// another process turns into a `StaleWrite` instead of a lost update.
    async fn update_counters_tx(
        &self,
        update: &CounterUpdate,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), RepositoryError> {
        if update.is_noop() {
            return Ok(());
        }

        let result = sqlx::query(
            r#"
            UPDATE resources
            SET up_votes = $2, down_votes = $3
            WHERE id = $1 AND up_votes = $4 AND down_votes = $5
            "#,
        )
        .bind(update.resource_id)
        .bind(to_db_count(update.current.up)?)
        .bind(to_db_count(update.current.down)?)
        .bind(to_db_count(update.previous.up)?)
        .bind(to_db_count(update.previous.down)?)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::stale(format!(
                "counters of resource {} changed concurrently",
                update.resource_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VotesRepository for PostgresVotesRepository {
    async fn find_resource(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError> {
        let query = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(resource_from_row).transpose()
    }

    async fn find_section_by_name(&self, name: &str) -> Result<Option<Section>, RepositoryError> {
        let row = sqlx::query("SELECT id, name FROM sections WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<Section, RepositoryError> {
            Ok(Section {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn resources_in_section(
        &self,
        section_id: SectionId,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let query = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE section_id = $1");
        let rows = sqlx::query(&query)
            .bind(section_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(resource_from_row).collect()
    }

    async fn find_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, resource_id, direction, voted_at
            FROM votes
            WHERE user_id = $1 AND resource_id = $2
            "#,
        )
        .bind(user_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<Vote, RepositoryError> {
            Ok(Vote {
                id: r.try_get("id")?,
                user_id: r.try_get("user_id")?,
                resource_id: r.try_get("resource_id")?,
                direction: VoteDirection::from_bool(r.try_get("direction")?),
                voted_at: r.try_get("voted_at")?,
            })
        })
        .transpose()
    }

    /// Atomically persists a complete changeset in a single transaction.
    ///
    /// Dropping the transaction on an early return rolls it back, so either
    /// every vote mutation and counter update lands or none does.
    async fn persist_changeset(&self, changeset: &Changeset<'_>) -> Result<(), RepositoryError> {
        if changeset.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for mutation in changeset.votes {
            self.apply_vote_mutation_tx(mutation, &mut tx).await?;
        }
        for update in changeset.counters {
            self.update_counters_tx(update, &mut tx).await?;
        }
        tx.commit().await?;

        debug!(
            votes = changeset.votes.len(),
            counters = changeset.counters.len(),
            "Changeset committed"
        );
        Ok(())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO sections (id, name) VALUES ($1, $2)")
            .bind(section.id)
            .bind(&section.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO resources (id, section_id, name, url, owner_id, up_votes, down_votes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(resource.id)
        .bind(resource.section_id)
        .bind(&resource.name)
        .bind(&resource.url)
        .bind(resource.owner)
        .bind(to_db_count(resource.up_votes)?)
        .bind(to_db_count(resource.down_votes)?)
        .bind(resource.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn resource_from_row(row: &PgRow) -> Result<Resource, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Resource {
        id,
        section_id: row.try_get("section_id")?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        owner: row.try_get("owner_id")?,
        up_votes: from_db_count(row.try_get("up_votes")?)?,
        down_votes: from_db_count(row.try_get("down_votes")?)?,
        created_at,
    })
}

fn to_db_count(count: u64) -> Result<i64, RepositoryError> {
    i64::try_from(count)
        .map_err(|_| RepositoryError::CounterOutOfRange(format!("{count} does not fit BIGINT")))
}

fn from_db_count(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::CounterOutOfRange(format!("negative counter {count}")))
}
