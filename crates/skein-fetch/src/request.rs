//! Request description handed to a [`Fetcher`](crate::Fetcher).

use std::fmt;

use serde_json::Value;
use url::Url;

/// HTTP method supported by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// Read a resource.
    Get,
    /// Trigger a remote side effect with a JSON body.
    Post,
}

/// One JSON request against a remote host.
///
/// Built by resolvers, executed by a [`Fetcher`](crate::Fetcher). The
/// bearer token, if any, has already passed the same-host check in
/// [`Credentials::token_for_host`](crate::Credentials::token_for_host);
/// the adapter attaches it blindly.
#[derive(Clone)]
pub struct FetchRequest {
    method: FetchMethod,
    url: Url,
    bearer: Option<String>,
    body: Option<Value>,
}

impl FetchRequest {
    /// Build an anonymous GET request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: FetchMethod::Get,
            url,
            bearer: None,
            body: None,
        }
    }

    /// Build a POST request with a JSON body.
    #[must_use]
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: FetchMethod::Post,
            url,
            bearer: None,
            body: Some(body),
        }
    }

    /// Attach a bearer token when one is available.
    ///
    /// `None` leaves the request anonymous, so call sites can pass
    /// [`Credentials::token_for_host`](crate::Credentials::token_for_host)
    /// straight through.
    #[must_use]
    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(ToOwned::to_owned);
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> FetchMethod {
        self.method
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Bearer token to attach, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    /// JSON body for POST requests.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
