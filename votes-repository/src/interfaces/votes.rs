//! This module defines the `VotesRepository` trait, which provides an interface
//! for interacting with the underlying data store for sections, resources and votes.
//! It abstracts the database operations for persistence and retrieval.
use votes_shared::types::{Changeset, Resource, ResourceId, Section, SectionId, UserId, Vote};

use crate::errors::RepositoryError;

/// A trait that defines the interface for interacting with the votes data repository.
///
/// Reads are plain lookups. The only write path used by the voting core is
/// `persist_changeset`, which must apply every mutation of the changeset or
/// none of them.
#[async_trait::async_trait]
pub trait VotesRepository: Send + Sync {
    /// Looks up a resource by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Resource))` - The resource with its current counters
    /// * `Ok(None)` - No resource with that id exists
    /// * `Err(RepositoryError)` - The lookup failed
    async fn find_resource(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError>;

    /// Looks up a section by its unique name.
    async fn find_section_by_name(&self, name: &str) -> Result<Option<Section>, RepositoryError>;

    /// Returns every resource belonging to the section, in no particular order.
    ///
    /// An unknown section id yields an empty vector.
    async fn resources_in_section(
        &self,
        section_id: SectionId,
    ) -> Result<Vec<Resource>, RepositoryError>;

    /// Returns the vote the user holds on the resource, if any.
    async fn find_vote(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, RepositoryError>;

    /// Atomically persists a `Changeset`.
    ///
    /// Vote mutations and counter updates are applied together. Counter updates
    /// are compare-and-set against `CounterUpdate::previous`; a mismatch or a
    /// duplicate vote insert aborts the whole changeset.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every mutation was applied
    /// * `Err(RepositoryError::UniqueViolation)` - An inserted vote already existed
    /// * `Err(RepositoryError::StaleWrite)` - A record changed underneath the changeset
    /// * `Err(RepositoryError)` - Any other failure; nothing was applied
    async fn persist_changeset(&self, changeset: &Changeset<'_>) -> Result<(), RepositoryError>;

    /// Stores a section. Used for seeding; not part of the voting core.
    async fn insert_section(&self, section: &Section) -> Result<(), RepositoryError>;

    /// Stores a resource with its current counters. Used for seeding; not part
    /// of the voting core.
    async fn insert_resource(&self, resource: &Resource) -> Result<(), RepositoryError>;
}
