//! Edge service: the bridge's HTTP surface.
//!
//! Every route except `/health` requires a credential (`X-API-Key` header or
//! `token` query parameter), checked before any upstream call is made.

pub mod credential;
pub mod error;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::AppState;

pub use error::{ApiError, Operation};

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/actors", get(routes::list_actors))
        .route("/actor-schema/{actor_id}", get(routes::actor_schema))
        .route("/run-actor", post(routes::run_actor))
        .route("/run-status/{run_id}", get(routes::run_status))
        .route_layer(middleware::from_fn(credential::require_credential))
        .route("/health", get(routes::health))
}
