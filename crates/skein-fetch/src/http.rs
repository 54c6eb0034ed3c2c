//! HTTP fetcher on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::fetcher::{FetchError, Fetcher};
use crate::request::{FetchMethod, FetchRequest};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// [`Fetcher`] implementation backed by a shared [`reqwest::Client`].
///
/// One client serves every host in a session; connection pooling is per
/// host inside reqwest. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a per-request timeout in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("skein/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Value, FetchError> {
        let url = request.url().clone();
        debug!(
            url = %url,
            method = ?request.method(),
            authenticated = request.bearer().is_some(),
            "Fetching remote JSON"
        );

        let mut builder = match request.method() {
            FetchMethod::Get => self.client.get(url.clone()),
            FetchMethod::Post => self.client.post(url.clone()),
        };
        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}
