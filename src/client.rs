//! HTTP client for the bridge's own API.
//!
//! This is what a presentation layer talks to: it carries one credential for
//! the whole session and exposes the four edge operations.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::api::credential::API_KEY_HEADER;
use crate::domain::{Actor, ActorPage, ActorSchema, Credential, Run};
use crate::watch::RunStatusSource;

/// Client error type.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The bridge answered with an error body.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body.
        message: String,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl(_) => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunActorBody<'a> {
    actor_id: &'a str,
    input: &'a Value,
}

#[derive(serde::Deserialize)]
struct ActorList {
    data: ActorPage,
}

/// HTTP client for the bridge API.
///
/// # Example
///
/// ```rust,no_run
/// use actor_bridge::client::BridgeClient;
/// use actor_bridge::domain::Credential;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credential = Credential::new("apify_api_xxx").unwrap();
/// let client = BridgeClient::new("http://localhost:3001/api", credential)?;
///
/// for actor in client.list_actors().await? {
///     println!("{} ({})", actor.display_name(), actor.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BridgeClient {
    base_url: Url,
    http: reqwest::Client,
    credential: Credential,
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("base_url", &self.base_url.as_str())
            .field("credential", &self.credential)
            .finish()
    }
}

impl BridgeClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The bridge API root (e.g., "http://localhost:3001/api")
    /// * `credential` - Platform token sent with every request
    pub fn new(base_url: impl AsRef<str>, credential: Credential) -> Result<Self> {
        Self::with_client(base_url, credential, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        credential: Credential,
        http: reqwest::Client,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http,
            credential,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_actors(&self) -> Result<Vec<Actor>> {
        let list: ActorList = self.get(&["actors"], "Failed to fetch actors").await?;
        Ok(list.data.items)
    }

    pub async fn actor_schema(&self, actor_id: &str) -> Result<ActorSchema> {
        self.get(&["actor-schema", actor_id], "Failed to fetch actor schema")
            .await
    }

    pub async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<Run> {
        let url = self.url(&["run-actor"])?;
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.credential.expose())
            .json(&RunActorBody { actor_id, input })
            .send()
            .await?;
        Self::handle_response(response, "Failed to run actor").await
    }

    pub async fn run_status(&self, run_id: &str) -> Result<Run> {
        self.get(&["run-status", run_id], "Failed to get run status")
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], fallback: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(segments)?)
            .header(API_KEY_HEADER, self.credential.expose())
            .send()
            .await?;
        Self::handle_response(response, fallback).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("error")?.as_str().map(str::to_string))
                .unwrap_or_else(|| fallback.to_string());
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl RunStatusSource for BridgeClient {
    type Error = ClientError;

    async fn run_status(&self, run_id: &str) -> Result<Run> {
        BridgeClient::run_status(self, run_id).await
    }
}
