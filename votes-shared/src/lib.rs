//! # Votes Shared
//! This crate defines the data structures shared across the voting workspace.
//! It includes resources, sections, votes, vote directions, ranked results and
//! the changesets committed by the vote coordinator.
pub mod types;
