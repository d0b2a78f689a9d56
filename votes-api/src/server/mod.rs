// Server module - HTTP server setup and routing
pub mod extract;
pub mod handlers;
pub mod identity;
pub mod response;
pub mod state;

use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use self::identity::USER_ID_HEADER;
use self::state::AppState;

/// Create CORS layer for localhost development
pub fn create_cors_layer() -> CorsLayer {
    let origins = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/votes",
            get(handlers::get_vote)
                .post(handlers::create_vote)
                .put(handlers::change_vote)
                .delete(handlers::remove_vote),
        )
        .route("/api/sections/:name/top", get(handlers::top_resources))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state)
}

/// Run the server on the specified address until ctrl-c is received.
pub async fn run_server(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    info!("Server listening on {}", addr);
    info!("- Votes endpoint: http://{}/api/votes", addr);
    info!("- Ranking endpoint: http://{}/api/sections/{{name}}/top", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
