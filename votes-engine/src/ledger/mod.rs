//! Up/down counters of the resources touched by a unit of work.
//!
//! `CounterLedger` is the only code that changes a resource's counters. It
//! stages new values next to the ones they were read as, so the commit can
//! write them compare-and-set style.
use votes_shared::types::{CounterUpdate, Resource, ResourceId, VoteCounts, VoteDirection};

use crate::errors::VoteError;

#[derive(Debug, Default)]
pub struct CounterLedger {
    updates: Vec<CounterUpdate>,
}

impl CounterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking the counters of `resource` as currently stored.
    ///
    /// Tracking the same resource twice keeps the first snapshot.
    pub fn track(&mut self, resource: &Resource) {
        if self.entry(resource.id).is_none() {
            self.updates.push(CounterUpdate {
                resource_id: resource.id,
                previous: resource.counts(),
                current: resource.counts(),
            });
        }
    }

    /// Adds one vote in `direction`. There is no upper bound other than
    /// saturation at `u64::MAX`.
    pub fn increment(
        &mut self,
        resource_id: ResourceId,
        direction: VoteDirection,
    ) -> Result<(), VoteError> {
        let counts = self.counts_mut(resource_id)?;
        let counter = counter_mut(counts, direction);
        *counter = counter.saturating_add(1);
        Ok(())
    }

    /// Removes one vote in `direction`. A counter already at zero stays at zero.
    pub fn decrement(
        &mut self,
        resource_id: ResourceId,
        direction: VoteDirection,
    ) -> Result<(), VoteError> {
        let counts = self.counts_mut(resource_id)?;
        let counter = counter_mut(counts, direction);
        if *counter > 0 {
            *counter -= 1;
        }
        Ok(())
    }

    /// Staged counters of a tracked resource.
    pub fn counts(&self, resource_id: ResourceId) -> Option<VoteCounts> {
        self.entry(resource_id).map(|u| u.current)
    }

    pub fn updates(&self) -> &[CounterUpdate] {
        &self.updates
    }

    fn entry(&self, resource_id: ResourceId) -> Option<&CounterUpdate> {
        self.updates.iter().find(|u| u.resource_id == resource_id)
    }

    fn counts_mut(&mut self, resource_id: ResourceId) -> Result<&mut VoteCounts, VoteError> {
        self.updates
            .iter_mut()
            .find(|u| u.resource_id == resource_id)
            .map(|u| &mut u.current)
            .ok_or(VoteError::ResourceNotFound(resource_id))
    }
}

fn counter_mut(counts: &mut VoteCounts, direction: VoteDirection) -> &mut u64 {
    match direction {
        VoteDirection::Up => &mut counts.up,
        VoteDirection::Down => &mut counts.down,
    }
}
