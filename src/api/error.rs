use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::upstream::UpstreamError;

/// Edge operation an upstream failure happened in. Selects the generic
/// message the caller sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListActors,
    FetchSchema,
    RunActor,
    RunStatus,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::ListActors => "Failed to fetch actors",
            Self::FetchSchema => "Failed to fetch actor schema",
            Self::RunActor => "Failed to run actor",
            Self::RunStatus => "Failed to fetch run status",
        }
    }

    fn event_name(self) -> &'static str {
        match self {
            Self::ListActors => "list_actors",
            Self::FetchSchema => "fetch_schema",
            Self::RunActor => "run_actor",
            Self::RunStatus => "run_status",
        }
    }
}

/// Errors the edge service reports to callers, rendered as
/// `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key is required")]
    MissingCredential,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid API key")]
    InvalidCredential,

    #[error("Request timed out")]
    RequestTimeout,

    /// Upstream detail is logged, never echoed back.
    #[error("{}", .operation.failure_message())]
    Upstream {
        operation: Operation,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    /// Normalize an upstream failure. A rejected credential is reported as
    /// such; every other failure collapses to the operation's generic message.
    pub fn upstream(operation: Operation, source: UpstreamError) -> Self {
        error!(
            name: "api.upstream.failed",
            operation = operation.event_name(),
            upstream_status = source.status(),
            error = %source,
            "Upstream call failed"
        );
        if source.is_unauthorized() {
            Self::InvalidCredential
        } else {
            Self::Upstream { operation, source }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
