//! # Votes Engine
//! This crate implements the vote aggregation and ranking core.
//!
//! - [`score`]: confidence-interval popularity score
//! - [`ledger`]: up/down counters of a resource, floored at zero
//! - [`store`]: individual vote records and the one-vote-per-user rule
//! - [`coordinator`]: atomic create/change/remove/get of a user's vote
//! - [`ranking`]: top-N resources of a section by score
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod locks;
pub mod ranking;
pub mod score;
pub mod store;

pub use config::EngineConfig;
pub use coordinator::{VoteCoordinator, VoteReceipt};
pub use errors::VoteError;
pub use identity::IdentityProvider;
pub use ranking::RankingQuery;
pub use score::ScoreEngine;
