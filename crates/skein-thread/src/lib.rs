//! Comment tree model for skein thread resolvers.
//!
//! Every thread source in skein reduces to the same problem: a set of flat
//! comment payloads, each declaring at most one parent, that must become a
//! single correctly rooted, correctly ordered reply tree. This crate provides
//! the shared machinery:
//!
//! - [`ThreadItem`]: the minimal contract a source payload must satisfy
//!   (identity, declared parent, optional reply-count claim)
//! - [`ThreadAssembly`]: the mutable per-resolution workspace, covering merge
//!   with deduplication, arrival-order attachment, authoritative reordering,
//!   and the bookkeeping that keeps fixed-point completion loops terminating
//! - [`CommentNode`] / [`ThreadResult`]: the immutable output handed to
//!   callers once assembly is done
//!
//! The assembly is exclusively owned by one resolution call; there is no
//! cross-call sharing and no locking.
//!
//! # Example
//!
//! ```ignore
//! use skein_thread::{ThreadAssembly, ThreadItem};
//!
//! let mut assembly = ThreadAssembly::new();
//! assembly.merge(fetched_comments);
//! assembly.attach_pending();
//! let tree = assembly.into_tree(&root_id)?;
//! ```

mod assembly;
mod item;
mod node;

pub use assembly::{AssemblyError, ThreadAssembly};
pub use item::ThreadItem;
pub use node::{CommentNode, ThreadResult};
