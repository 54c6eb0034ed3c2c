//! Federated thread resolution for Mastodon-compatible instances.
//!
//! A post's replies are scattered across the fediverse: the server the
//! viewer browses holds one cached view, the server the thread started on
//! holds the authoritative one, and neither is guaranteed complete. This
//! crate turns a single post reference into the full reply tree:
//!
//! - [`FediResolver`]: the resolution engine, covering origin discovery,
//!   ancestor walking, subtree completion, and graceful degradation when
//!   any host but the required ones is unreachable
//! - [`derive_origin`]: maps a post's ActivityPub uri to the instance that
//!   owns its canonical copy
//! - [`Status`], [`Context`], [`Notification`]: the client API payloads,
//!   tolerant of fields this crate does not consume
//!
//! Identifiers are instance-local. The same post has a different id on
//! every server that federates it, so the resolver pins one host (the
//! origin when reachable, otherwise the serving host) and keys the entire
//! assembly in that host's id space. [`ThreadResult::origin_instance`]
//! names the pinned host.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use skein_fedi::FediResolver;
//! use skein_fetch::HttpFetcher;
//!
//! let resolver = FediResolver::new(Arc::new(HttpFetcher::new()?));
//! let thread = resolver.resolve("113861357581176205", "fosstodon.org", None).await?;
//! println!("{} replies", thread.root.descendant_count());
//! # Ok(())
//! # }
//! ```
//!
//! [`ThreadResult::origin_instance`]: skein_thread::ThreadResult

mod api;
mod error;
mod origin;
mod resolver;
mod types;

pub use error::FediError;
pub use origin::{Origin, derive_origin};
pub use resolver::FediResolver;
pub use types::{Account, Context, FetchedRef, Notification, NotificationKind, Status};
