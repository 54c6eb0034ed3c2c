//! Immutable output types handed to callers after assembly.

use crate::item::ThreadItem;

/// One comment with its ordered replies.
///
/// The reply order is the render order: arrival order for federated
/// sources, authoritative order where a source provides one. The tree is
/// immutable once returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode<T> {
    /// The source payload.
    pub payload: T,
    /// Direct replies, in render order.
    pub replies: Vec<CommentNode<T>>,
}

impl<T: ThreadItem> CommentNode<T> {
    /// Id of this comment.
    pub fn id(&self) -> T::Id {
        self.payload.item_id()
    }

    /// Total number of comments in this subtree, excluding this node.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.replies
            .iter()
            .map(|r| 1 + r.descendant_count())
            .sum()
    }

    /// Walk the subtree depth-first, visiting this node first.
    pub fn walk(&self, visit: &mut impl FnMut(&CommentNode<T>, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&CommentNode<T>, usize)) {
        visit(self, depth);
        for reply in &self.replies {
            reply.walk_at(depth + 1, visit);
        }
    }
}

/// A fully resolved thread.
///
/// Produced by resolvers whose output is a single rooted tree. The root is
/// the top of the conversation, which may be arbitrarily far above the
/// comment the caller actually asked to view.
#[derive(Debug, Clone)]
pub struct ThreadResult<T> {
    /// Root of the assembled tree.
    pub root: CommentNode<T>,
    /// The comment the caller asked to view, possibly re-resolved to its
    /// canonical copy during assembly.
    pub original_post: T,
    /// True when at least one fetch failed or completeness could not be
    /// verified. Never a false negative: a complete thread may be flagged,
    /// an incomplete one never goes unflagged.
    pub possibly_incomplete: bool,
    /// Host the thread was ultimately resolved against (federated sources).
    pub origin_instance: String,
}
