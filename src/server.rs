use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api::{self, ApiError};
use crate::config::AppConfig;
use crate::upstream::{ActorPlatform, ApifyClient};

/// Run inputs are small JSON documents; anything larger is refused.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let platform: Arc<dyn ActorPlatform> = Arc::new(ApifyClient::new(&config.upstream)?);

    info!(
        name: "upstream.config.loaded",
        base_url = %config.upstream.base_url,
        wait_for_finish_secs = config.upstream.wait_for_finish_secs,
        "Actor platform configuration loaded"
    );

    let state = AppState::new(platform, config.upstream.wait_for_finish());
    let app = build_app(state, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Assemble the full application: edge routes under `/api` plus the
/// cross-cutting layers.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let timeout = Duration::from_secs(config.server.request_timeout_secs);

    let app = Router::new()
        .nest("/api", api::build_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // The platform may hold a run request for the full wait budget, so the
        // timeout is configured above it.
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => ApiError::RequestTimeout.into_response(),
                }
            },
        ))
        .layer(TraceLayer::new_for_http());

    let app = if config.server.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        return;
    }
    info!(name: "server.stopping", "Shutdown signal received");
}
