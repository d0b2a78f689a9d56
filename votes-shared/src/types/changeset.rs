use crate::types::{ResourceId, Vote, VoteCounts, VoteDirection, VoteId};

/// A single mutation of the vote records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteMutation {
    /// Insert a new vote; fails if the (user, resource) pair already has one.
    Insert(Vote),
    /// Flip the direction of an existing vote in place.
    UpdateDirection { vote_id: VoteId, direction: VoteDirection },
    /// Delete an existing vote.
    Delete { vote_id: VoteId },
}

/// New counter values for a resource, along with the values they were derived
/// from so the commit can detect a concurrent writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    pub resource_id: ResourceId,
    pub previous: VoteCounts,
    pub current: VoteCounts,
}

impl CounterUpdate {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// Represents a collection of changes to be persisted in the votes repository.
///
/// A `Changeset` bundles vote mutations and counter updates together so they
/// are committed atomically: either all of them become visible or none do.
#[derive(Debug, Clone, Copy)]
pub struct Changeset<'a> {
    pub votes: &'a [VoteMutation],
    pub counters: &'a [CounterUpdate],
}

impl Changeset<'_> {
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty() && self.counters.iter().all(CounterUpdate::is_noop)
    }
}
