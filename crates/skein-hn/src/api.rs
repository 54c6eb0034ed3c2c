//! URL construction for the two comment sources.

use url::Url;

/// Page size for the search index's comment listing. The index caps pages
/// at this size; stories with more comments span multiple pages.
pub(crate) const HITS_PER_PAGE: u64 = 1000;

/// Search query for every comment belonging to one story.
pub(crate) fn search_url(base: &str, story_id: u64, page: u64) -> Result<Url, url::ParseError> {
    let base = base.trim_end_matches('/');
    Url::parse(&format!(
        "{base}/search?tags=comment,story_{story_id}&hitsPerPage={HITS_PER_PAGE}&page={page}"
    ))
}

/// Official item endpoint for one story or comment.
pub(crate) fn item_url(base: &str, id: u64) -> Result<Url, url::ParseError> {
    let base = base.trim_end_matches('/');
    Url::parse(&format!("{base}/item/{id}.json"))
}
