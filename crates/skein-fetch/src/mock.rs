//! Mock fetcher implementation for testing.
//!
//! Provides [`MockFetcher`] for unit testing resolvers without network
//! access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::fetcher::{FetchError, Fetcher};
use crate::request::FetchRequest;

/// One scripted outcome for a URL.
#[derive(Debug, Clone)]
enum Scripted {
    Json(Value),
    Status(u16),
    Transport(String),
}

/// A request observed by the mock, in the fields tests assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Full request URL.
    pub url: String,
    /// Whether a bearer token was attached.
    pub authenticated: bool,
}

/// Mock fetcher for testing.
///
/// Scripts responses and failures per exact URL. Each URL holds a queue of
/// outcomes; the last outcome is sticky, so a URL scripted once can be
/// fetched any number of times. Fetching an unscripted URL fails with a
/// transport error naming the URL, so a missing script shows up directly
/// in test output. Every call is recorded for host-order and credential
/// assertions.
///
/// # Example
///
/// ```ignore
/// use skein_fetch::{FetchRequest, Fetcher, MockFetcher};
/// use serde_json::json;
/// use url::Url;
///
/// let fetcher = MockFetcher::new()
///     .with_json("https://example.social/api/v1/statuses/1", json!({"id": "1"}))
///     .with_status("https://example.social/api/v1/statuses/2", 404);
///
/// let url = Url::parse("https://example.social/api/v1/statuses/1").unwrap();
/// let body = fetcher.fetch(FetchRequest::get(url)).await.unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockFetcher {
    /// Create a new mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a 200 JSON response for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.push(url.into(), Scripted::Json(body));
        self
    }

    /// Script a non-200 response status for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.push(url.into(), Scripted::Status(status));
        self
    }

    /// Script a transport failure for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_transport_error(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(url.into(), Scripted::Transport(message.into()));
        self
    }

    fn push(&self, url: String, outcome: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(outcome);
    }

    /// URLs fetched so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|recorded| recorded.url.clone())
            .collect()
    }

    /// Requests fetched so far, with their credential state.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Value, FetchError> {
        let url = request.url().to_string();
        self.log.lock().unwrap().push(RecordedRequest {
            url: url.clone(),
            authenticated: request.bearer().is_some(),
        });

        let outcome = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match outcome {
            Some(Scripted::Json(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(FetchError::Status { status, url }),
            Some(Scripted::Transport(message)) => Err(FetchError::Transport(message)),
            None => Err(FetchError::Transport(format!(
                "no scripted response for {url}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_scripted_json_is_returned() {
        let fetcher = MockFetcher::new().with_json("https://a.example/x", json!({"id": 1}));

        let body = fetcher.fetch(get("https://a.example/x")).await.unwrap();

        assert_eq!(body, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_scripted_status_becomes_error() {
        let fetcher = MockFetcher::new().with_status("https://a.example/x", 404);

        let err = fetcher.fetch(get("https://a.example/x")).await.unwrap_err();

        match err {
            FetchError::Status { status, url } => {
                assert_eq!(status, 404);
                assert_eq!(url, "https://a.example/x");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_last_scripted_outcome_is_sticky() {
        let fetcher = MockFetcher::new().with_json("https://a.example/x", json!(1));

        let first = fetcher.fetch(get("https://a.example/x")).await.unwrap();
        let second = fetcher.fetch(get("https://a.example/x")).await.unwrap();

        assert_eq!(first, json!(1));
        assert_eq!(second, json!(1));
    }

    #[tokio::test]
    async fn test_queued_outcomes_play_in_order() {
        let fetcher = MockFetcher::new()
            .with_status("https://a.example/x", 503)
            .with_json("https://a.example/x", json!(2));

        let first = fetcher.fetch(get("https://a.example/x")).await;
        let second = fetcher.fetch(get("https://a.example/x")).await.unwrap();

        assert!(first.is_err());
        assert_eq!(second, json!(2));
    }

    #[tokio::test]
    async fn test_unscripted_url_fails_with_named_url() {
        let fetcher = MockFetcher::new();

        let err = fetcher.fetch(get("https://a.example/miss")).await.unwrap_err();

        assert!(err.to_string().contains("https://a.example/miss"));
    }

    #[tokio::test]
    async fn test_log_records_order_and_credentials() {
        let fetcher = MockFetcher::new()
            .with_json("https://home.example/1", json!(1))
            .with_json("https://other.example/2", json!(2));

        fetcher
            .fetch(get("https://home.example/1").with_bearer(Some("tok")))
            .await
            .unwrap();
        fetcher.fetch(get("https://other.example/2")).await.unwrap();

        assert_eq!(
            fetcher.recorded(),
            vec![
                RecordedRequest {
                    url: "https://home.example/1".to_owned(),
                    authenticated: true,
                },
                RecordedRequest {
                    url: "https://other.example/2".to_owned(),
                    authenticated: false,
                },
            ]
        );
        assert_eq!(
            fetcher.requests(),
            vec!["https://home.example/1", "https://other.example/2"]
        );
    }
}
