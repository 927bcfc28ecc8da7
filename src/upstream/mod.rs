//! Client side of the actor platform.
//!
//! [`ActorPlatform`] is the seam between the run coordinator and the
//! third-party API. Every call is a single request/response: no retries,
//! no caching, no state beyond the HTTP connection pool.

pub mod apify;
#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ActorPage, ActorSchema, Credential, RunSnapshot};

pub use apify::ApifyClient;

/// Failure of a single upstream call.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The platform answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure. The request URL is stripped
    /// because it carries the token.
    #[error("upstream transport error: {0}")]
    Transport(reqwest::Error),

    /// The platform answered 2xx with a body we could not read.
    #[error("unexpected upstream payload: {0}")]
    Decode(String),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl UpstreamError {
    /// HTTP status reported by the platform, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// The platform rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Operations the bridge needs from the actor platform.
#[async_trait]
pub trait ActorPlatform: Send + Sync {
    /// Actors visible to the credential's account, with the platform's
    /// paging counters.
    async fn list_actors(&self, credential: &Credential) -> Result<ActorPage, UpstreamError>;

    async fn fetch_input_schema(
        &self,
        credential: &Credential,
        actor_id: &str,
    ) -> Result<ActorSchema, UpstreamError>;

    /// Start a run. `wait` bounds how long the platform may hold the request
    /// open for a quick completion, so the returned snapshot may already be
    /// terminal.
    async fn start_run(
        &self,
        credential: &Credential,
        actor_id: &str,
        input: &Value,
        wait: Duration,
    ) -> Result<RunSnapshot, UpstreamError>;

    async fn fetch_run_status(
        &self,
        credential: &Credential,
        run_id: &str,
    ) -> Result<RunSnapshot, UpstreamError>;

    /// Items of a dataset in platform order. Empty datasets yield `[]`.
    async fn fetch_dataset_items(
        &self,
        credential: &Credential,
        dataset_id: &str,
    ) -> Result<Vec<Value>, UpstreamError>;
}
