//! Votes Service Library
//!
//! HTTP surface of the vote aggregation and ranking engine: configuration,
//! dependency wiring, error types and the axum server.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{Dependencies, Settings};
pub use errors::ApiError;
