//! Ordered Hacker News threads from two disagreeing sources.
//!
//! Neither of the public comment APIs is sufficient on its own: the
//! search index returns a story's entire comment set in a few paged
//! calls but in relevance order, while the official item API returns
//! authoritative display order but only one node per call. This crate
//! reconciles them:
//!
//! - [`HnResolver`]: bulk-fetches the full comment set, roots it on the
//!   story's own `kids` list, and repairs reply order per ambiguous node
//!   with depth-wise concurrent item fetches
//! - [`Comment`] (search hit) and [`Item`] (official item): the two
//!   payload schemas, parsed into one shared numeric id space
//!
//! Reorder fetches are an optimization target, not a requirement: a
//! failed one leaves that node's replies in arrival order, and the
//! result is still complete.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use skein_hn::HnResolver;
//! use skein_fetch::HttpFetcher;
//!
//! let resolver = HnResolver::new(Arc::new(HttpFetcher::new()?));
//! let forest = resolver.resolve_ordered_thread(38_601_213).await?;
//! for top_level in &forest {
//!     println!("{} replies", top_level.descendant_count());
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod resolver;
mod types;

pub use error::HnError;
pub use resolver::{HnResolver, ITEM_ENDPOINT, SEARCH_ENDPOINT};
pub use types::{Comment, Item, SearchResponse};
