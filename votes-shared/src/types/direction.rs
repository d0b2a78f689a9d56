use serde::{Deserialize, Serialize};

use crate::types::Vote;

/// Represents the direction of a vote cast by a user.
///
/// Serialized as a boolean, `true` meaning up.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "bool", into = "bool")]
pub enum VoteDirection {
    /// Indicates an upvote or positive endorsement.
    Up,
    /// Indicates a downvote or negative endorsement.
    Down,
}

impl VoteDirection {
    /// Maps the boolean form (`true` = up) onto a direction.
    pub fn from_bool(up: bool) -> Self {
        if up { Self::Up } else { Self::Down }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

impl From<bool> for VoteDirection {
    fn from(up: bool) -> Self {
        Self::from_bool(up)
    }
}

impl From<VoteDirection> for bool {
    fn from(direction: VoteDirection) -> Self {
        direction.is_up()
    }
}

/// State of the (user, resource) pair in the voting state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteState {
    NoVote,
    Upvoted,
    Downvoted,
}

impl VoteState {
    /// Derives the state from the vote currently stored for the pair, if any.
    pub fn of(vote: Option<&Vote>) -> Self {
        match vote.map(|v| v.direction) {
            None => Self::NoVote,
            Some(VoteDirection::Up) => Self::Upvoted,
            Some(VoteDirection::Down) => Self::Downvoted,
        }
    }
}
