//! Error types for the voting engine.
mod vote;

pub use vote::VoteError;
