//! Mutable assembly workspace for one thread resolution.
//!
//! A [`ThreadAssembly`] is created fresh per resolution request, fed batches
//! of comments as fetch rounds complete, and finally materialized into an
//! immutable [`CommentNode`] tree. It is exclusively owned by the resolving
//! call; nothing here is shared or locked.
//!
//! # Attachment model
//!
//! Nodes are held in an arena keyed by id. Attaching never fails: a node
//! whose declared parent is present is appended to that parent's reply list
//! in arrival order; a node whose parent is absent simply stays pending. A
//! pending node is re-examined on every attach pass, so a parent discovered
//! by a later fetch round adopts its earlier-arrived children. Whatever is
//! still unreachable at materialization is logged and excluded; an
//! unreachable parent must not fail the whole assembly.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::item::ThreadItem;
use crate::node::CommentNode;

/// Error from materializing an assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// The requested root id is not present in the assembled set.
    #[error("root comment {0} is not present in the assembled set")]
    RootMissing(String),

    /// The requested root is attached beneath another comment, so the tree
    /// has no uniquely determined top.
    #[error("root comment {0} is attached beneath another comment")]
    RootAttached(String),
}

/// Arena entry for one comment.
struct Slot<T: ThreadItem> {
    payload: T,
    /// Attached children, in arrival order until reordered.
    replies: Vec<T::Id>,
    /// True once this node has been appended to its parent's reply list.
    attached: bool,
    /// True once this node's subtree has been explicitly queried.
    replies_fetched: bool,
}

/// The mutable comment set for one resolution.
///
/// Deduplicates by id, attaches children in arrival order, repairs order
/// against authoritative child lists, and tracks which subtrees have been
/// explicitly fetched so completion loops attempt each node at most once.
pub struct ThreadAssembly<T: ThreadItem> {
    slots: HashMap<T::Id, Slot<T>>,
    /// Insertion order; keeps attach passes and scans deterministic.
    order: Vec<T::Id>,
}

impl<T: ThreadItem> Default for ThreadAssembly<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: ThreadItem> ThreadAssembly<T> {
    /// Create an empty assembly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of comments in the assembled set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no comments have been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True when the given id is present in the assembled set.
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.slots.contains_key(id)
    }

    /// Look up a comment payload by id.
    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.slots.get(id).map(|slot| &slot.payload)
    }

    /// Merge a batch of comments, deduplicating by id.
    ///
    /// Comments whose id is already present are ignored; the same remote
    /// comment discovered via two fetch rounds collapses to one node.
    /// Returns the ids that were genuinely new, in batch order. Completion
    /// loops run until this comes back empty.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = T>) -> Vec<T::Id> {
        let mut fresh = Vec::new();
        for item in batch {
            let id = item.item_id();
            if self.slots.contains_key(&id) {
                debug!(id = %id, "duplicate comment ignored during merge");
                continue;
            }
            self.slots.insert(
                id.clone(),
                Slot {
                    payload: item,
                    replies: Vec::new(),
                    attached: false,
                    replies_fetched: false,
                },
            );
            self.order.push(id.clone());
            fresh.push(id);
        }
        fresh
    }

    /// Attach every pending node whose declared parent is present.
    ///
    /// Children are appended to their parent's reply list in arrival order.
    /// Attachment needs the parent to be merged, not attached, so one pass
    /// handles a batch listing a child before its parent; nodes left
    /// pending are re-examined on the pass after the next merge. Returns
    /// the number of nodes attached.
    pub fn attach_pending(&mut self) -> usize {
        let mut attached_total = 0;
        for i in 0..self.order.len() {
            let id = self.order[i].clone();
            if self.try_attach(&id) {
                attached_total += 1;
            }
        }
        attached_total
    }

    /// Attach one node if its parent is present. Returns true on attach.
    fn try_attach(&mut self, id: &T::Id) -> bool {
        let Some(slot) = self.slots.get(id) else {
            return false;
        };
        if slot.attached {
            return false;
        }
        let Some(parent) = slot.payload.parent_id() else {
            return false;
        };
        // A self-referencing comment can never attach; it surfaces in the
        // excluded set at materialization.
        if parent == *id || !self.slots.contains_key(&parent) {
            return false;
        }
        if let Some(parent_slot) = self.slots.get_mut(&parent) {
            parent_slot.replies.push(id.clone());
        }
        if let Some(child_slot) = self.slots.get_mut(id) {
            child_slot.attached = true;
        }
        true
    }

    /// Replace a node's reply list with the authoritative ordering.
    ///
    /// Children present in `authoritative` keep that sequence; attached
    /// children absent from it are detached and end up excluded at
    /// materialization. Ids in `authoritative` that were never fetched are
    /// skipped. Order repair is the final assembly phase: callers must not
    /// run further attach passes afterwards, or detached children would be
    /// re-adopted.
    pub fn reorder_replies(&mut self, parent: &T::Id, authoritative: &[T::Id]) {
        let Some(slot) = self.slots.get(parent) else {
            return;
        };
        let current: HashSet<&T::Id> = slot.replies.iter().collect();
        let auth: HashSet<&T::Id> = authoritative.iter().collect();

        let reordered: Vec<T::Id> = authoritative
            .iter()
            .filter(|id| current.contains(*id))
            .cloned()
            .collect();
        let dropped: Vec<T::Id> = slot
            .replies
            .iter()
            .filter(|id| !auth.contains(*id))
            .cloned()
            .collect();

        for id in &dropped {
            warn!(
                child = %id,
                parent = %parent,
                "dropping reply absent from authoritative child list"
            );
            if let Some(child_slot) = self.slots.get_mut(id) {
                child_slot.attached = false;
            }
        }
        if let Some(slot) = self.slots.get_mut(parent) {
            slot.replies = reordered;
        }
    }

    /// Number of replies currently attached to a node.
    #[must_use]
    pub fn reply_count(&self, id: &T::Id) -> usize {
        self.slots.get(id).map_or(0, |slot| slot.replies.len())
    }

    /// Ids of the replies currently attached to a node, in order.
    #[must_use]
    pub fn reply_ids(&self, id: &T::Id) -> &[T::Id] {
        self.slots.get(id).map_or(&[], |slot| &slot.replies)
    }

    /// True once the node has been appended to a parent's reply list.
    #[must_use]
    pub fn is_attached(&self, id: &T::Id) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.attached)
    }

    /// Ids whose reply-count claim exceeds their attached replies, in
    /// insertion order, whether or not their subtree was queried.
    ///
    /// A nonempty shortfall after a completion loop finishes means the
    /// sources never substantiated their own counts; callers surface that
    /// as possible incompleteness rather than claiming a full tree.
    #[must_use]
    pub fn hint_shortfall(&self) -> Vec<T::Id> {
        self.order
            .iter()
            .filter(|id| {
                self.slots.get(*id).is_some_and(|slot| {
                    slot.payload
                        .reply_count_hint()
                        .is_some_and(|hint| hint > slot.replies.len() as u64)
                })
            })
            .cloned()
            .collect()
    }

    /// Ids whose reply-count claim exceeds their attached replies and whose
    /// subtree has not been explicitly queried yet.
    ///
    /// Callers mark each returned id with [`mark_replies_fetched`] before
    /// fetching, so every node is attempted at most once and the completion
    /// loop is guaranteed to terminate.
    ///
    /// [`mark_replies_fetched`]: Self::mark_replies_fetched
    #[must_use]
    pub fn needs_more_replies(&self) -> Vec<T::Id> {
        self.hint_shortfall()
            .into_iter()
            .filter(|id| !self.replies_fetched(id))
            .collect()
    }

    /// Record that a node's subtree has been explicitly queried.
    pub fn mark_replies_fetched(&mut self, id: &T::Id) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.replies_fetched = true;
        }
    }

    /// True once the node's subtree has been explicitly queried.
    #[must_use]
    pub fn replies_fetched(&self, id: &T::Id) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.replies_fetched)
    }

    /// Ids that declare no parent at all, in insertion order.
    ///
    /// A consistent single-thread assembly has at most one of these.
    #[must_use]
    pub fn parentless(&self) -> Vec<T::Id> {
        self.order
            .iter()
            .filter(|id| {
                self.slots
                    .get(*id)
                    .is_some_and(|slot| slot.payload.parent_id().is_none())
            })
            .cloned()
            .collect()
    }

    /// Ids not attached beneath any parent, in insertion order.
    ///
    /// Contains the root candidate plus any orphans whose declared parent
    /// never showed up in a fetched batch.
    #[must_use]
    pub fn unattached(&self) -> Vec<T::Id> {
        self.order
            .iter()
            .filter(|id| !self.is_attached(id))
            .cloned()
            .collect()
    }

    /// Materialize the assembly into an immutable tree rooted at `root`.
    ///
    /// Nodes unreachable from the root (orphans whose parent was never
    /// fetched, or replies dropped during order repair) are logged and
    /// excluded; they never fail the assembly.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::RootMissing`] if `root` is not in the set,
    /// or [`AssemblyError::RootAttached`] if `root` sits beneath another
    /// comment and therefore cannot be a tree top.
    pub fn into_tree(mut self, root: &T::Id) -> Result<CommentNode<T>, AssemblyError> {
        match self.slots.get(root) {
            None => return Err(AssemblyError::RootMissing(root.to_string())),
            Some(slot) if slot.attached => {
                return Err(AssemblyError::RootAttached(root.to_string()));
            }
            Some(_) => {}
        }
        // take_subtree is infallible for a present root.
        let Some(tree) = self.take_subtree(root) else {
            return Err(AssemblyError::RootMissing(root.to_string()));
        };
        self.log_excluded();
        Ok(tree)
    }

    /// Materialize a forest for the given roots, in the given order.
    ///
    /// Roots absent from the set (deleted or never fetched) are skipped
    /// with a log line; remaining unreachable nodes are logged and
    /// excluded as in [`into_tree`](Self::into_tree).
    pub fn into_forest(mut self, roots: &[T::Id]) -> Vec<CommentNode<T>> {
        let mut forest = Vec::with_capacity(roots.len());
        for root in roots {
            match self.take_subtree(root) {
                Some(tree) => forest.push(tree),
                None => debug!(id = %root, "listed root not present in assembled set"),
            }
        }
        self.log_excluded();
        forest
    }

    /// Remove a subtree from the arena and build its output node.
    fn take_subtree(&mut self, id: &T::Id) -> Option<CommentNode<T>> {
        let slot = self.slots.remove(id)?;
        let mut replies = Vec::with_capacity(slot.replies.len());
        for child in &slot.replies {
            if let Some(node) = self.take_subtree(child) {
                replies.push(node);
            }
        }
        Some(CommentNode {
            payload: slot.payload,
            replies,
        })
    }

    /// Log every node left behind after materialization.
    fn log_excluded(&self) {
        for id in &self.order {
            if let Some(slot) = self.slots.get(id) {
                match slot.payload.parent_id() {
                    Some(parent) => warn!(
                        id = %id,
                        parent = %parent,
                        "orphaned comment excluded from thread"
                    ),
                    None => warn!(id = %id, "unreachable comment excluded from thread"),
                }
            }
        }
    }
}
