//! Remote JSON fetch adapter for skein thread resolvers.
//!
//! This crate provides the [`Fetcher`] trait for abstracting one HTTP round
//! trip against a named remote host, decoding a JSON payload. This enables:
//!
//! - **Unit testing** resolvers without network access
//! - **One policy point** for timeouts, the user agent, and the convention
//!   that any non-200 status is an error
//! - **Credential scoping**: a viewer token is attached per request and
//!   never sent to a host other than its home instance
//!
//! The adapter performs exactly one attempt per call; it never retries.
//! Retry and fallback decisions belong to the resolvers, which know which
//! fetches are required and which merely improve completeness.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Fetcher`] trait with a single `fetch()` method
//! - [`HttpFetcher`] implementation on reqwest
//! - [`MockFetcher`] for testing (behind the `mock` feature flag)
//! - [`Credentials`] with same-host-only token release
//!
//! # Example
//!
//! ```ignore
//! use skein_fetch::{FetchRequest, Fetcher, HttpFetcher, fetch_json};
//! use url::Url;
//!
//! let fetcher = HttpFetcher::new()?;
//! let url = Url::parse("https://mastodon.social/api/v1/statuses/1")?;
//! let status: Status = fetch_json(&fetcher, FetchRequest::get(url)).await?;
//! ```

mod credentials;
mod fetcher;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod request;

pub use credentials::Credentials;
pub use fetcher::{FetchError, Fetcher, fetch_json};
pub use http::HttpFetcher;
#[cfg(feature = "mock")]
pub use mock::{MockFetcher, RecordedRequest};
pub use request::{FetchMethod, FetchRequest};
