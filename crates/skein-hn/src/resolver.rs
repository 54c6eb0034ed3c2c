//! Order reconciliation between the two comment sources.
//!
//! The search index returns every comment of a story in a handful of
//! calls, but in relevance order; the official API returns true display
//! order, but only one node per call. Fetching a large thread entirely
//! through the official API would cost one call per comment. The resolver
//! takes completeness from the index and order from the official API:
//! build the full tree from the bulk index, then repair reply order only
//! where it is ambiguous, level by level.
//!
//! A node with zero or one attached reply cannot be mis-ordered, so the
//! number of repair calls grows with branching, not with thread size.

use std::sync::Arc;

use futures::future::{self, join_all};
use skein_fetch::{FetchError, FetchRequest, Fetcher, fetch_json};
use skein_thread::{CommentNode, ThreadAssembly};
use tracing::{debug, info, warn};

use crate::api;
use crate::error::HnError;
use crate::types::{Comment, Item, SearchResponse};

/// Default base for the search index queries.
pub const SEARCH_ENDPOINT: &str = "https://hn.algolia.com/api/v1";

/// Default base for the official item API.
pub const ITEM_ENDPOINT: &str = "https://hacker-news.firebaseio.com/v0";

/// Resolves a story's comments into the site's display order.
pub struct HnResolver {
    fetcher: Arc<dyn Fetcher>,
    search_base: String,
    item_base: String,
}

impl HnResolver {
    /// Create a resolver against the public endpoints.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            search_base: SEARCH_ENDPOINT.to_owned(),
            item_base: ITEM_ENDPOINT.to_owned(),
        }
    }

    /// Override both API bases, for mirrors or tests.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        search_base: impl Into<String>,
        item_base: impl Into<String>,
    ) -> Self {
        self.search_base = search_base.into();
        self.item_base = item_base.into();
        self
    }

    /// Fetch a story's own item.
    ///
    /// # Errors
    ///
    /// Returns [`HnError::StoryItem`] when the item cannot be fetched.
    pub async fn story(&self, story_id: u64) -> Result<Item, HnError> {
        self.fetch_item(story_id)
            .await
            .map_err(|source| HnError::StoryItem { story_id, source })
    }

    /// Resolve the complete comment forest of a story, ordered as the
    /// site displays it.
    ///
    /// Top-level order always comes from the story's own `kids` list.
    /// Deeper levels keep bulk-arrival order unless a node has more than
    /// one reply, in which case its authoritative `kids` are fetched and
    /// applied; those fetches fan out per tree depth. A failed reorder
    /// fetch leaves that node in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`HnError::Bulk`] when any page of the comment index
    /// cannot be fetched, and [`HnError::StoryItem`] when the story's
    /// item cannot. Both are required: one guarantees completeness, the
    /// other roots the order.
    pub async fn resolve_ordered_thread(
        &self,
        story_id: u64,
    ) -> Result<Vec<CommentNode<Comment>>, HnError> {
        let (first_page, story) = future::join(
            self.fetch_bulk_page(story_id, 0),
            self.fetch_item(story_id),
        )
        .await;
        let first_page = first_page.map_err(|source| HnError::Bulk { story_id, source })?;
        let story = story.map_err(|source| HnError::StoryItem { story_id, source })?;

        let mut assembly = self.assemble_bulk(story_id, first_page).await?;
        self.repair_order(&mut assembly, &story.kids).await;

        let forest = assembly.into_forest(&story.kids);
        let total: usize = forest.iter().map(|root| root.descendant_count() + 1).sum();
        info!(
            story = story_id,
            top_level = forest.len(),
            comments = total,
            "story thread reconciled"
        );
        Ok(forest)
    }

    /// Merge every page of the story's bulk comment listing.
    ///
    /// The first page is already in hand; remaining pages fan out
    /// concurrently. Any page failing is fatal: the bulk set is the
    /// completeness guarantee, and it holds only when every page lands.
    async fn assemble_bulk(
        &self,
        story_id: u64,
        first_page: SearchResponse,
    ) -> Result<ThreadAssembly<Comment>, HnError> {
        let total_pages = first_page.nb_pages;
        let mut assembly = ThreadAssembly::new();
        assembly.merge(first_page.hits);
        if total_pages > 1 {
            debug!(story = story_id, pages = total_pages, "comment index spans multiple pages");
            let fetches = (1..total_pages).map(|page| self.fetch_bulk_page(story_id, page));
            for result in join_all(fetches).await {
                let page = result.map_err(|source| HnError::Bulk { story_id, source })?;
                assembly.merge(page.hits);
            }
        }
        assembly.attach_pending();
        debug!(story = story_id, comments = assembly.len(), "bulk comment set assembled");
        Ok(assembly)
    }

    /// Walk the tree breadth-first and repair each ambiguous reply list.
    async fn repair_order(&self, assembly: &mut ThreadAssembly<Comment>, roots: &[u64]) {
        let mut level: Vec<u64> = roots
            .iter()
            .copied()
            .filter(|id| assembly.contains(id))
            .collect();
        while !level.is_empty() {
            let ambiguous: Vec<u64> = level
                .iter()
                .copied()
                .filter(|id| assembly.reply_count(id) > 1)
                .collect();
            if !ambiguous.is_empty() {
                debug!(fetches = ambiguous.len(), "repairing reply order at one depth");
                let fetches = ambiguous.iter().map(|id| self.fetch_item(*id));
                let results = join_all(fetches).await;
                for (id, result) in ambiguous.iter().zip(results) {
                    match result {
                        Ok(item) => assembly.reorder_replies(id, &item.kids),
                        Err(err) => {
                            warn!(
                                id = *id,
                                error = %err,
                                "reorder fetch failed, keeping arrival order"
                            );
                        }
                    }
                }
            }
            // Descend only after this depth's repairs, so dropped replies
            // are not visited.
            let mut next = Vec::new();
            for id in &level {
                next.extend_from_slice(assembly.reply_ids(id));
            }
            level = next;
        }
    }

    async fn fetch_bulk_page(&self, story_id: u64, page: u64) -> Result<SearchResponse, FetchError> {
        let url = api::search_url(&self.search_base, story_id, page)?;
        fetch_json(self.fetcher.as_ref(), FetchRequest::get(url)).await
    }

    async fn fetch_item(&self, id: u64) -> Result<Item, FetchError> {
        let url = api::item_url(&self.item_base, id)?;
        fetch_json(self.fetcher.as_ref(), FetchRequest::get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use skein_fetch::MockFetcher;

    use super::*;

    const STORY: u64 = 900;

    fn hit(id: u64, parent: u64) -> Value {
        json!({
            "objectID": id.to_string(),
            "parent_id": parent,
            "story_id": STORY,
            "author": "pg",
            "comment_text": "<p>text</p>",
            "created_at_i": 1_702_319_400,
        })
    }

    fn search_page(hits: Vec<Value>, page: u64, nb_pages: u64) -> Value {
        let count = hits.len();
        json!({
            "hits": hits,
            "page": page,
            "nbPages": nb_pages,
            "nbHits": count,
            "hitsPerPage": 1000,
        })
    }

    fn story_item(kids: &[u64]) -> Value {
        json!({
            "id": STORY,
            "by": "dang",
            "title": "A story",
            "type": "story",
            "kids": kids,
            "descendants": kids.len(),
        })
    }

    fn comment_item(id: u64, kids: &[u64]) -> Value {
        json!({ "id": id, "by": "pg", "type": "comment", "kids": kids })
    }

    fn search_api(page: u64) -> String {
        format!(
            "https://hn.algolia.com/api/v1/search?tags=comment,story_{STORY}&hitsPerPage=1000&page={page}"
        )
    }

    fn item_api(id: u64) -> String {
        format!("https://hacker-news.firebaseio.com/v0/item/{id}.json")
    }

    fn resolver(fetcher: &Arc<MockFetcher>) -> HnResolver {
        HnResolver::new(Arc::clone(fetcher) as Arc<dyn Fetcher>)
    }

    fn forest_ids(forest: &[CommentNode<Comment>]) -> Vec<u64> {
        forest.iter().map(CommentNode::id).collect()
    }

    #[tokio::test]
    async fn test_top_level_order_follows_story_kids() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(vec![hit(3, STORY), hit(1, STORY), hit(2, STORY)], 0, 1),
                )
                .with_json(item_api(STORY), story_item(&[1, 2, 3])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest), vec![1, 2, 3]);
        // Top-level comments never need their own reorder fetch.
        assert_eq!(fetcher.requests(), vec![search_api(0), item_api(STORY)]);
    }

    #[tokio::test]
    async fn test_ambiguous_node_is_reordered_from_its_kids() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(
                        vec![hit(10, STORY), hit(22, 10), hit(23, 10), hit(21, 10)],
                        0,
                        1,
                    ),
                )
                .with_json(item_api(STORY), story_item(&[10]))
                .with_json(item_api(10), comment_item(10, &[21, 22, 23])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest[0].replies), vec![21, 22, 23]);
        assert_eq!(
            fetcher.requests(),
            vec![search_api(0), item_api(STORY), item_api(10)]
        );
    }

    #[tokio::test]
    async fn test_single_reply_skips_the_reorder_fetch() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(vec![hit(10, STORY), hit(11, 10)], 0, 1),
                )
                .with_json(item_api(STORY), story_item(&[10])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest[0].replies), vec![11]);
        assert_eq!(fetcher.requests(), vec![search_api(0), item_api(STORY)]);
    }

    #[tokio::test]
    async fn test_reorder_descends_level_by_level() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(
                        vec![
                            hit(10, STORY),
                            hit(22, 10),
                            hit(21, 10),
                            hit(32, 22),
                            hit(31, 22),
                        ],
                        0,
                        1,
                    ),
                )
                .with_json(item_api(STORY), story_item(&[10]))
                .with_json(item_api(10), comment_item(10, &[21, 22]))
                .with_json(item_api(22), comment_item(22, &[31, 32])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        let node_10 = &forest[0];
        assert_eq!(forest_ids(&node_10.replies), vec![21, 22]);
        assert_eq!(forest_ids(&node_10.replies[1].replies), vec![31, 32]);
        assert_eq!(
            fetcher.requests(),
            vec![
                search_api(0),
                item_api(STORY),
                item_api(10),
                item_api(22),
            ]
        );
    }

    #[tokio::test]
    async fn test_reorder_drops_replies_absent_from_kids() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(vec![hit(10, STORY), hit(21, 10), hit(22, 10)], 0, 1),
                )
                .with_json(item_api(STORY), story_item(&[10]))
                .with_json(item_api(10), comment_item(10, &[22])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest[0].replies), vec![22]);
        assert_eq!(forest[0].descendant_count(), 1);
    }

    #[tokio::test]
    async fn test_reorder_fetch_failure_keeps_arrival_order() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(
                        vec![hit(10, STORY), hit(22, 10), hit(23, 10), hit(21, 10)],
                        0,
                        1,
                    ),
                )
                .with_json(item_api(STORY), story_item(&[10]))
                .with_status(item_api(10), 500),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest[0].replies), vec![22, 23, 21]);
    }

    #[tokio::test]
    async fn test_bulk_pages_are_all_merged() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(search_api(0), search_page(vec![hit(1, STORY)], 0, 2))
                .with_json(search_api(1), search_page(vec![hit(2, STORY)], 1, 2))
                .with_json(item_api(STORY), story_item(&[1, 2])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest), vec![1, 2]);
        assert_eq!(
            fetcher.requests(),
            vec![search_api(0), item_api(STORY), search_api(1)]
        );
    }

    #[tokio::test]
    async fn test_bulk_fetch_failure_is_fatal() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_status(search_api(0), 503)
                .with_json(item_api(STORY), story_item(&[])),
        );

        let err = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap_err();

        assert!(matches!(err, HnError::Bulk { story_id, .. } if story_id == STORY));
    }

    #[tokio::test]
    async fn test_story_item_failure_is_fatal() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(search_api(0), search_page(vec![], 0, 1))
                .with_status(item_api(STORY), 404),
        );

        let err = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap_err();

        assert!(matches!(err, HnError::StoryItem { story_id, .. } if story_id == STORY));
    }

    #[tokio::test]
    async fn test_kids_missing_from_bulk_are_skipped() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(
                    search_api(0),
                    search_page(vec![hit(1, STORY), hit(2, STORY)], 0, 1),
                )
                // Kid 999 is deleted: listed by the story, absent from the
                // comment index.
                .with_json(item_api(STORY), story_item(&[1, 999, 2])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert_eq!(forest_ids(&forest), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_story_without_comments_yields_empty_forest() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_json(search_api(0), search_page(vec![], 0, 0))
                .with_json(item_api(STORY), story_item(&[])),
        );

        let forest = resolver(&fetcher)
            .resolve_ordered_thread(STORY)
            .await
            .unwrap();

        assert!(forest.is_empty());
    }

    #[tokio::test]
    async fn test_story_accessor_surfaces_title() {
        let fetcher =
            Arc::new(MockFetcher::new().with_json(item_api(STORY), story_item(&[1, 2])));

        let story = resolver(&fetcher).story(STORY).await.unwrap();

        assert_eq!(story.title.as_deref(), Some("A story"));
        assert_eq!(story.kids, vec![1, 2]);
    }
}
