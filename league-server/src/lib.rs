//! League Server - HTTP API for match executors and dashboards
//!
//! This crate provides the web backend:
//! - League settings and agent registration
//! - Match recording
//! - Incremental rating updates and rebuilds
//! - Ratings, AlphaRank, matchups and next-pair scheduling

mod error;
mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::ServerState;

/// Server configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: [u8; 4],
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: [127, 0, 0, 1],
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Agent registry
        .route("/api/agents", post(routes::agents::register_agent))
        .route(
            "/api/leagues/{league_id}/entrants",
            post(routes::agents::enter_league),
        )
        // League settings
        .route(
            "/api/leagues/{league_id}/settings",
            get(routes::leagues::get_settings).put(routes::leagues::put_settings),
        )
        // Match log
        .route(
            "/api/leagues/{league_id}/matches",
            post(routes::matches::record_match),
        )
        // Rating processors
        .route(
            "/api/leagues/{league_id}/update",
            post(routes::leagues::update_ratings),
        )
        .route(
            "/api/leagues/{league_id}/rebuild",
            post(routes::leagues::rebuild_ratings),
        )
        // Read views
        .route(
            "/api/leagues/{league_id}/ratings",
            get(routes::rankings::get_ratings),
        )
        .route(
            "/api/leagues/{league_id}/alpharank",
            get(routes::rankings::get_alpharank),
        )
        .route(
            "/api/leagues/{league_id}/matchups",
            get(routes::rankings::get_matchups),
        )
        .route(
            "/api/leagues/{league_id}/next-pair",
            get(routes::rankings::get_next_pair),
        )
        // Shared state
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig, state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = config.addr();
    let router = create_router(state);

    tracing::info!("League server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
