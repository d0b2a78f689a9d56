// App state for the Axum server
use std::sync::Arc;

use axum::http::HeaderMap;
use votes_engine::{IdentityProvider, RankingQuery, VoteCoordinator};

use crate::config::Dependencies;
use crate::server::identity::HeaderIdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<VoteCoordinator>,
    pub ranking: RankingQuery,
    pub identity: Arc<dyn IdentityProvider<HeaderMap>>,
    pub top_n_default: usize,
}

impl AppState {
    /// Builds the state from wired dependencies, resolving users from the
    /// `x-user-id` header.
    pub fn new(dependencies: Dependencies, top_n_default: usize) -> Self {
        Self {
            coordinator: dependencies.coordinator,
            ranking: dependencies.ranking,
            identity: Arc::new(HeaderIdentityProvider),
            top_n_default,
        }
    }
}
