//! Error types for federated thread resolution.

use skein_fetch::FetchError;
use skein_thread::AssemblyError;

/// Error from resolving a federated thread.
///
/// Only fatal and structural failures surface here. Degraded fetches
/// (origin fallback, ancestor walk, subtree completion) are absorbed into
/// `possibly_incomplete` on the result instead.
#[derive(Debug, thiserror::Error)]
pub enum FediError {
    /// The post the caller asked to view could not be fetched.
    #[error("could not fetch post {id} from {host}: {source}")]
    PostFetch {
        /// Host the fetch targeted.
        host: String,
        /// Post id on that host.
        id: String,
        #[source]
        source: FetchError,
    },

    /// No usable host could serve the thread context.
    #[error("could not fetch thread context from {host}: {source}")]
    ContextFetch {
        /// Last host tried.
        host: String,
        #[source]
        source: FetchError,
    },

    /// The assembled set has no uniquely determined root.
    #[error("thread root could not be uniquely determined (candidates: {candidates:?})")]
    NoRoot {
        /// Ids that contend for the top of the tree.
        candidates: Vec<String>,
    },

    /// The viewed post declares a parent that never appeared in any
    /// fetched batch; returning a tree would contradict the post's own
    /// data.
    #[error("post {id} replies to {parent_id}, which is missing from the assembled thread")]
    MissingParent {
        /// The viewed post.
        id: String,
        /// Its declared parent.
        parent_id: String,
    },

    /// The chosen root could not be materialized.
    #[error("thread assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
}
