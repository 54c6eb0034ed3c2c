//! Fetcher trait and error type.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::request::FetchRequest;

/// Error from one fetch attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, timeout,
    /// connection reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The remote answered with a status other than 200.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL, for multi-host debugging.
        url: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request URL could not be constructed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// One HTTP round trip against a remote host, decoding a JSON payload.
///
/// Implementations perform exactly one attempt and never retry; resolvers
/// own all fallback policy. The trait is object safe so resolvers can hold
/// `Arc<dyn Fetcher>` and tests can substitute a mock.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Execute the request and return the decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure, a non-200 response
    /// status, or an undecodable body.
    async fn fetch(&self, request: FetchRequest) -> Result<Value, FetchError>;
}

/// Fetch and deserialize into a concrete payload type.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] when the payload does not match `T`, or
/// any error from the underlying [`Fetcher`].
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    request: FetchRequest,
) -> Result<T, FetchError> {
    let value = fetcher.fetch(request).await?;
    Ok(serde_json::from_value(value)?)
}
