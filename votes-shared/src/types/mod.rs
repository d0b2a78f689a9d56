mod changeset;
mod direction;
mod ranked_resource;
mod resource;
mod section;
mod vote;

pub use changeset::{Changeset, CounterUpdate, VoteMutation};
pub use direction::{VoteDirection, VoteState};
pub use ranked_resource::RankedResource;
pub use resource::{Resource, VoteCounts};
pub use section::Section;
pub use vote::Vote;

use uuid::Uuid;

pub type UserId = Uuid;
pub type ResourceId = Uuid;
pub type SectionId = Uuid;
pub type VoteId = Uuid;

/// Key identifying the single vote a user may hold on a resource.
pub type VoteKey = (UserId, ResourceId);
