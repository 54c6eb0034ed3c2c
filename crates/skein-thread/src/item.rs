//! The contract a source comment payload must satisfy to be assembled.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A comment payload that can participate in thread assembly.
///
/// Sources keep their own payload types (a fediverse status, a forum
/// comment); assembly only needs identity, the declared parent, and the
/// source's own claim about how many replies exist.
///
/// # Identity
///
/// `item_id` must be unique within one resolution. Ids are source-scoped:
/// a fediverse status id from one instance must never be compared against
/// an id from another resolution run.
pub trait ThreadItem {
    /// Source-specific id type (string for federated sources, integer for
    /// forum item APIs).
    type Id: Clone + Eq + Hash + Debug + Display;

    /// Unique id of this comment within its source.
    fn item_id(&self) -> Self::Id;

    /// Id of the comment this one replies to, if any.
    ///
    /// `None` marks a thread root. The declared parent may be absent from
    /// the assembled set; such nodes are recorded as orphans rather than
    /// failing assembly.
    fn parent_id(&self) -> Option<Self::Id>;

    /// The source's own claim of how many direct replies exist.
    ///
    /// May be wrong in either direction; resolvers use it only to decide
    /// whether a subtree is worth another fetch. `None` means the source
    /// makes no claim (completeness is guaranteed some other way).
    fn reply_count_hint(&self) -> Option<u64> {
        None
    }
}
