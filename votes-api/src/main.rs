//! Votes Service Main Entry Point
//!
//! Serves the vote and ranking HTTP API on top of the voting engine.

use dotenv::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use votes_api::server::{self, state::AppState};
use votes_api::{ApiError, Dependencies, Settings};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), ApiError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("votes_api=info,votes_engine=info,tower_http=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| ApiError::Tracing(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| ApiError::Tracing(e.to_string()))?;
    }

    info!(
        service_name = "votes-api",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing()?;

    let settings = Settings::from_env();
    info!(
        min_sample_size = settings.engine.min_sample_size,
        commit_timeout_ms = %settings.engine.commit_timeout.as_millis(),
        top_n_default = settings.top_n_default,
        "Starting votes service"
    );

    let dependencies = match Dependencies::new(&settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let app = server::create_app(AppState::new(dependencies, settings.top_n_default));
    if let Err(e) = server::run_server(app, settings.server_addr).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Votes service stopped");
    Ok(())
}
