//! # Votes Repository
//! This crate provides traits and implementations for interacting with the
//! votes data repository. It includes definitions for errors, interfaces,
//! a PostgreSQL implementation and an in-memory implementation.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::VotesRepository;
pub use memory::InMemoryVotesRepository;
pub use postgres::PostgresVotesRepository;
