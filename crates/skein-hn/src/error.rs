//! Error types for order reconciliation.

use skein_fetch::FetchError;

/// Error from resolving an ordered story thread.
///
/// Only the two required fetches surface here. Individual reorder fetch
/// failures degrade to arrival order instead; the bulk index already
/// guarantees completeness, so nothing is missing, only possibly
/// mis-sequenced.
#[derive(Debug, thiserror::Error)]
pub enum HnError {
    /// The bulk comment index for the story could not be fetched.
    #[error("could not fetch the comment index for story {story_id}: {source}")]
    Bulk {
        /// Story whose comments were requested.
        story_id: u64,
        #[source]
        source: FetchError,
    },

    /// The story's own item, which carries the authoritative top-level
    /// ordering, could not be fetched.
    #[error("could not fetch story item {story_id}: {source}")]
    StoryItem {
        /// Story whose item was requested.
        story_id: u64,
        #[source]
        source: FetchError,
    },
}
