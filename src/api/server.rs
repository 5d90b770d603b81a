//! HTTP gateway server

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::gate::{auth_gate, Gate};
use crate::config::Config;
use crate::error::Result;

use super::relay::Relay;
use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub relay: Relay,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let relay = Relay::new(
            &config.backend.url,
            Duration::from_secs(config.backend.timeout_secs),
        )?;
        Ok(Self { config, relay })
    }
}

/// Run the HTTP gateway
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);
    tracing::info!(backend = %state.relay.backend(), "Relaying to backend");

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let gate = Gate::new(&state.config.cookie.name);
    let pages = ServeDir::new(&state.config.server.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/health", get(routes::health))
        // Relay routes
        .route(
            "/api/auth/{*route}",
            get(routes::auth_get)
                .post(routes::auth_post)
                .put(routes::auth_put)
                .delete(routes::auth_delete),
        )
        .route(
            "/api/content",
            get(routes::content_get).delete(routes::content_delete),
        )
        .route(
            "/api/content/{*rest}",
            get(routes::content_item_get).delete(routes::content_item_delete),
        )
        // Pages behind the gate
        .fallback_service(pages)
        // Middleware
        .layer(middleware::from_fn_with_state(gate, auth_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
