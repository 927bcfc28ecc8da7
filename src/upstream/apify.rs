//! Apify v2 REST implementation of [`ActorPlatform`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ActorPlatform, UpstreamError};
use crate::config::UpstreamConfig;
use crate::domain::{ActorPage, ActorSchema, Credential, RunSnapshot};

/// `{"data": ...}` wrapper the platform puts around most resources.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client for the Apify platform API.
#[derive(Clone)]
pub struct ApifyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApifyClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApifyClient {
    /// Create a client from configuration.
    ///
    /// The HTTP timeout must be longer than the run wait budget, otherwise a
    /// synchronous completion would be cut off client-side.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Self::with_client(&config.base_url, http)
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, UpstreamError> {
        // A trailing slash makes every segment push land under the base path.
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::Decode(format!("base URL {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        credential: &Credential,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, UpstreamError> {
        debug!(name: "upstream.request", method = %method, path = %url.path(), "Calling actor platform");

        let mut request = self
            .http
            .request(method, url)
            .query(&[("token", credential.expose())])
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ActorPlatform for ApifyClient {
    async fn list_actors(&self, credential: &Credential) -> Result<ActorPage, UpstreamError> {
        let url = self.endpoint(&["acts"])?;
        let page: Envelope<ActorPage> = self.send(Method::GET, url, credential, &[], None).await?;
        Ok(page.data)
    }

    async fn fetch_input_schema(
        &self,
        credential: &Credential,
        actor_id: &str,
    ) -> Result<ActorSchema, UpstreamError> {
        let url = self.endpoint(&["actors", actor_id, "input-schema"])?;
        self.send(Method::GET, url, credential, &[], None).await
    }

    async fn start_run(
        &self,
        credential: &Credential,
        actor_id: &str,
        input: &Value,
        wait: Duration,
    ) -> Result<RunSnapshot, UpstreamError> {
        let url = self.endpoint(&["actors", actor_id, "runs"])?;
        let query = [("waitForFinish", wait.as_secs().to_string())];
        let run: Envelope<RunSnapshot> = self
            .send(Method::POST, url, credential, &query, Some(input))
            .await?;
        Ok(run.data)
    }

    async fn fetch_run_status(
        &self,
        credential: &Credential,
        run_id: &str,
    ) -> Result<RunSnapshot, UpstreamError> {
        let url = self.endpoint(&["actor-runs", run_id])?;
        let run: Envelope<RunSnapshot> = self.send(Method::GET, url, credential, &[], None).await?;
        Ok(run.data)
    }

    async fn fetch_dataset_items(
        &self,
        credential: &Credential,
        dataset_id: &str,
    ) -> Result<Vec<Value>, UpstreamError> {
        let url = self.endpoint(&["datasets", dataset_id, "items"])?;
        let query = [("format", "json".to_string())];
        self.send(Method::GET, url, credential, &query, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApifyClient {
        ApifyClient::with_client(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://api.apify.com/v2");
        let url = client.endpoint(&["actor-runs", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://api.apify.com/v2/actor-runs/abc");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("https://api.apify.com/v2/");
        let url = client
            .endpoint(&["actors", "john~my actor", "runs"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.apify.com/v2/actors/john~my%20actor/runs"
        );
    }

    #[test]
    fn test_endpoint_rejects_slash_injection() {
        let client = client("https://api.apify.com/v2");
        let url = client.endpoint(&["datasets", "../acts", "items"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.apify.com/v2/datasets/..%2Facts/items"
        );
    }
}
