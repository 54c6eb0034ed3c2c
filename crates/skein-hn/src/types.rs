//! Hacker News payload schemas, both sources.
//!
//! The search index and the official item API describe the same comments
//! with different shapes and different guarantees. [`Comment`] is a search
//! hit (complete coverage, arbitrary order, string ids); [`Item`] is an
//! official item (authoritative `kids` order, numeric ids, one node per
//! call). Structs keep the consumed subset; unknown fields pass through
//! untouched.

use serde::{Deserialize, Deserializer};
use skein_thread::ThreadItem;

/// One page of the search index's comment listing for a story.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Comments on this page, in relevance order (not reply order).
    pub hits: Vec<Comment>,
    /// Zero-based index of this page.
    #[serde(default)]
    pub page: u64,
    /// Total number of pages for the query.
    #[serde(rename = "nbPages", default)]
    pub nb_pages: u64,
    /// Total number of comments across all pages.
    #[serde(rename = "nbHits", default)]
    pub nb_hits: u64,
}

/// A comment as returned by the search index.
///
/// The index serves ids as strings; they are parsed into the official
/// API's numeric id space on deserialization so both sources key the same
/// assembly.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(rename = "objectID", deserialize_with = "id_from_string")]
    pub id: u64,
    /// Direct parent; the story itself for top-level comments.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Story the comment belongs to.
    #[serde(default)]
    pub story_id: Option<u64>,
    /// Absent for deleted comments.
    #[serde(default)]
    pub author: Option<String>,
    /// HTML fragment; absent for deleted comments.
    #[serde(default)]
    pub comment_text: Option<String>,
    /// Creation time, unix seconds.
    #[serde(default)]
    pub created_at_i: i64,
}

impl ThreadItem for Comment {
    type Id = u64;

    fn item_id(&self) -> u64 {
        self.id
    }

    fn parent_id(&self) -> Option<u64> {
        self.parent_id
    }
}

/// An item from the official API.
///
/// Serves stories and comments alike; only `kids` order is authoritative
/// here, the flat comment set comes from the search index.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: u64,
    /// Direct children in the site's display order.
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub by: Option<String>,
    /// Story title; absent on comments.
    #[serde(default)]
    pub title: Option<String>,
    /// Total comment count; stories only.
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

fn id_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
