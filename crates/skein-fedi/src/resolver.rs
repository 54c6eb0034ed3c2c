//! Federated thread resolution.
//!
//! Given one post reference, assemble the complete reply tree it belongs
//! to. The canonical copy of a thread usually lives on a different server
//! than the one the viewer is browsing, and any single server holds an
//! incomplete, possibly stale view. Resolution therefore proceeds in
//! rounds: find the canonical origin, walk upward to the true root, fetch
//! downward from the root, then keep querying subtrees whose reply counts
//! claim more than the servers returned, until no node qualifies.
//!
//! Only the viewed post and the thread context are required. Everything
//! else degrades: an unreachable origin falls back to the serving host's
//! cached view, a failed ancestor walk proceeds with what is known, and a
//! failed subtree fetch skips that subtree. Every degradation sets
//! `possibly_incomplete` on the result so callers can say so instead of
//! presenting a partial tree as complete.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{self, join_all};
use skein_fetch::{Credentials, FetchError, FetchRequest, Fetcher, fetch_json};
use skein_thread::{ThreadAssembly, ThreadResult};
use tracing::{debug, info, warn};

use crate::api;
use crate::error::FediError;
use crate::origin::{Origin, derive_origin};
use crate::types::{Context, FetchedRef, Notification, Status};

/// Resolves complete reply trees across federated instances.
pub struct FediResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl FediResolver {
    /// Create a resolver on top of a fetch adapter.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve the full thread containing the post `post_id` on `host`.
    ///
    /// `host` is the bare hostname of the instance whose id space
    /// `post_id` belongs to; it need not be the thread's origin. Boosts
    /// are dereferenced to the post they republish. The returned tree is
    /// keyed in the id space of [`ThreadResult::origin_instance`].
    ///
    /// # Errors
    ///
    /// Returns [`FediError::PostFetch`] when the post itself cannot be
    /// fetched, [`FediError::ContextFetch`] when no host can serve the
    /// thread context, and a structural error when the fetched data
    /// contradicts itself.
    pub async fn resolve(
        &self,
        post_id: &str,
        host: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ThreadResult<Status>, FediError> {
        let fetched = self
            .fetch_status(host, post_id, credentials)
            .await
            .map_err(|source| FediError::PostFetch {
                host: host.to_owned(),
                id: post_id.to_owned(),
                source,
            })?;
        let post = FetchedRef::from_status(fetched).into_view_target();
        self.resolve_status(post, host, credentials).await
    }

    /// Resolve the thread behind a notification's subject post.
    ///
    /// Returns `Ok(None)` for notifications without a post subject.
    /// Notifications are served by the viewer's home instance, so the
    /// subject is resolved in that instance's id space.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve), minus the initial post fetch:
    /// the notification already carries the post payload.
    pub async fn resolve_notification(
        &self,
        notification: Notification,
        credentials: &Credentials,
    ) -> Result<Option<ThreadResult<Status>>, FediError> {
        let Some(fetched) = FetchedRef::from_notification(notification) else {
            return Ok(None);
        };
        let post = fetched.into_view_target();
        let result = self
            .resolve_status(post, credentials.instance(), Some(credentials))
            .await?;
        Ok(Some(result))
    }

    /// Resolve the full thread around an already fetched post.
    ///
    /// `host` is the instance whose id space `post.id` belongs to.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve), minus the initial post fetch.
    pub async fn resolve_status(
        &self,
        mut post: Status,
        host: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ThreadResult<Status>, FediError> {
        let mut incomplete = false;

        // The serving host may hold only a cached federated copy; the
        // origin named by the post's own uri is authoritative.
        let origin = derive_origin(&post).unwrap_or_else(|| Origin {
            host: host.to_owned(),
            id: post.id.clone(),
        });
        debug!(host = %origin.host, id = %origin.id, "derived canonical origin");

        let (pivot, context) = self
            .context_with_fallback(origin, host, &post, credentials, &mut incomplete)
            .await?;
        let Context {
            ancestors: mut chain,
            descendants: pivot_descendants,
        } = context;

        self.reconcile_identity(&mut post, &pivot, host, &chain, credentials, &mut incomplete)
            .await;

        let (walk_descendants, walk_pivots) = self
            .walk_to_root(&mut chain, &pivot.host, &post, credentials, &mut incomplete)
            .await;
        let root_id = chain
            .first()
            .map_or_else(|| post.id.clone(), |root| root.id.clone());

        let (fresh_root, root_descendants) = if root_id == post.id {
            // The post is its own root; its context is already in hand.
            (None, Vec::new())
        } else {
            self.anchor_root(&root_id, &pivot.host, credentials, &mut incomplete)
                .await
        };

        let mut assembly: ThreadAssembly<Status> = ThreadAssembly::new();
        assembly.merge([post.clone()]);
        assembly.merge(fresh_root);
        assembly.merge(chain);
        assembly.merge(pivot_descendants);
        assembly.merge(walk_descendants);
        assembly.merge(root_descendants);
        assembly.attach_pending();

        // Contexts were explicitly fetched for these pivots; they must
        // not be queried again by the completion loop.
        assembly.mark_replies_fetched(&post.id);
        for id in &walk_pivots {
            assembly.mark_replies_fetched(id);
        }
        assembly.mark_replies_fetched(&root_id);

        self.complete_subtrees(&mut assembly, &pivot.host, credentials, &mut incomplete)
            .await;
        if !assembly.hint_shortfall().is_empty() {
            // Some server still claims more replies than any fetch
            // produced; the claim cannot be verified complete.
            incomplete = true;
        }

        Self::validate(&assembly, &post, &root_id, incomplete)?;

        let root = assembly.into_tree(&root_id)?;
        info!(
            root = %root.id(),
            nodes = root.descendant_count() + 1,
            origin = %pivot.host,
            incomplete,
            "thread assembled"
        );
        Ok(ThreadResult {
            root,
            original_post: post,
            possibly_incomplete: incomplete,
            origin_instance: pivot.host,
        })
    }

    /// Fetch the thread context, preferring the canonical origin.
    ///
    /// An unreachable origin falls back to the serving host's cached
    /// view. The fallback is flagged; a failure on the only available
    /// host is fatal.
    async fn context_with_fallback(
        &self,
        origin: Origin,
        host: &str,
        post: &Status,
        credentials: Option<&Credentials>,
        incomplete: &mut bool,
    ) -> Result<(Origin, Context), FediError> {
        match self
            .fetch_context(&origin.host, &origin.id, credentials)
            .await
        {
            Ok(context) => Ok((origin, context)),
            Err(source) if origin.host.eq_ignore_ascii_case(host) => Err(FediError::ContextFetch {
                host: origin.host,
                source,
            }),
            Err(err) => {
                warn!(
                    origin = %origin.host,
                    error = %err,
                    "origin unreachable, falling back to the serving host's view"
                );
                *incomplete = true;
                let context = self
                    .fetch_context(host, &post.id, credentials)
                    .await
                    .map_err(|source| FediError::ContextFetch {
                        host: host.to_owned(),
                        source,
                    })?;
                Ok((
                    Origin {
                        host: host.to_owned(),
                        id: post.id.clone(),
                    },
                    context,
                ))
            }
        }
    }

    /// Re-resolve the viewed post on the host the context came from.
    ///
    /// The viewer's favourite and boost counts are properties of one
    /// specific copy; after pivoting to the origin they must come from
    /// the origin's copy. When the re-fetch fails the stale payload is
    /// kept but re-keyed into the pivot's id space, so it can still join
    /// the assembly alongside the origin's ancestors and descendants.
    async fn reconcile_identity(
        &self,
        post: &mut Status,
        pivot: &Origin,
        host: &str,
        chain: &[Status],
        credentials: Option<&Credentials>,
        incomplete: &mut bool,
    ) {
        if pivot.host.eq_ignore_ascii_case(host) && pivot.id == post.id {
            return;
        }
        match self.fetch_status(&pivot.host, &pivot.id, credentials).await {
            Ok(canonical) => *post = canonical,
            Err(err) => {
                warn!(
                    host = %pivot.host,
                    id = %pivot.id,
                    error = %err,
                    "could not re-resolve post on its origin, keeping the stale copy"
                );
                *incomplete = true;
                post.id = pivot.id.clone();
                post.in_reply_to_id = chain.last().map(|parent| parent.id.clone());
            }
        }
    }

    /// Walk the ancestor chain upward until its top declares no parent.
    ///
    /// Context calls are pivoted on the earliest known ancestor; newly
    /// discovered ancestors are prepended. A failed or non-advancing
    /// fetch ends the walk with what is known. Returns the descendants
    /// seen along the way and the pivots whose subtrees are now fetched.
    async fn walk_to_root(
        &self,
        chain: &mut Vec<Status>,
        pivot_host: &str,
        post: &Status,
        credentials: Option<&Credentials>,
        incomplete: &mut bool,
    ) -> (Vec<Status>, Vec<String>) {
        let mut walk_descendants = Vec::new();
        let mut walk_pivots = Vec::new();
        let mut seen: HashSet<String> = chain.iter().map(|ancestor| ancestor.id.clone()).collect();
        seen.insert(post.id.clone());

        while let Some(earliest) = chain.first() {
            if earliest.in_reply_to_id.is_none() {
                break;
            }
            let pivot_id = earliest.id.clone();
            match self.fetch_context(pivot_host, &pivot_id, credentials).await {
                Ok(more) => {
                    let fresh: Vec<Status> = more
                        .ancestors
                        .into_iter()
                        .filter(|ancestor| seen.insert(ancestor.id.clone()))
                        .collect();
                    if fresh.is_empty() {
                        warn!(
                            id = %pivot_id,
                            "ancestor declares a parent the server does not return"
                        );
                        *incomplete = true;
                        break;
                    }
                    walk_descendants.extend(more.descendants);
                    walk_pivots.push(pivot_id);
                    chain.splice(0..0, fresh);
                }
                Err(err) => {
                    warn!(
                        id = %pivot_id,
                        error = %err,
                        "ancestor walk fetch failed, proceeding with known ancestors"
                    );
                    *incomplete = true;
                    break;
                }
            }
        }
        (walk_descendants, walk_pivots)
    }

    /// Fetch the root's own post object and its context, concurrently.
    ///
    /// Both fetches merely improve on data already in hand (fresh reply
    /// counts, descendants relative to a stable root), so either failing
    /// degrades instead of aborting. A root context that itself reports
    /// ancestors means the walk stopped short; those ancestors are not
    /// merged, the result is just flagged.
    async fn anchor_root(
        &self,
        root_id: &str,
        pivot_host: &str,
        credentials: Option<&Credentials>,
        incomplete: &mut bool,
    ) -> (Option<Status>, Vec<Status>) {
        let (root_post, root_context) = future::join(
            self.fetch_status(pivot_host, root_id, credentials),
            self.fetch_context(pivot_host, root_id, credentials),
        )
        .await;

        let fresh_root = match root_post {
            Ok(status) => Some(status),
            Err(err) => {
                warn!(id = %root_id, error = %err, "root re-fetch failed, keeping the walked copy");
                *incomplete = true;
                None
            }
        };
        let root_descendants = match root_context {
            Ok(context) => {
                if !context.ancestors.is_empty() {
                    warn!(id = %root_id, "chosen root still has ancestors upstream");
                    *incomplete = true;
                }
                context.descendants
            }
            Err(err) => {
                warn!(id = %root_id, error = %err, "root context fetch failed");
                *incomplete = true;
                Vec::new()
            }
        };
        (fresh_root, root_descendants)
    }

    /// Query every node whose reply-count claim exceeds its attached
    /// replies, each at most once, until none qualifies.
    ///
    /// Fetches within a round fan out concurrently; a failure skips that
    /// subtree and flags the result rather than aborting the round.
    async fn complete_subtrees(
        &self,
        assembly: &mut ThreadAssembly<Status>,
        pivot_host: &str,
        credentials: Option<&Credentials>,
        incomplete: &mut bool,
    ) {
        loop {
            let pending = assembly.needs_more_replies();
            if pending.is_empty() {
                break;
            }
            debug!(count = pending.len(), "fetching under-reported subtrees");
            for id in &pending {
                assembly.mark_replies_fetched(id);
            }
            let fetches = pending
                .iter()
                .map(|id| self.fetch_context(pivot_host, id, credentials));
            let results = join_all(fetches).await;
            for (id, result) in pending.iter().zip(results) {
                match result {
                    Ok(context) => {
                        assembly.merge(context.descendants);
                    }
                    Err(err) => {
                        warn!(id = %id, error = %err, "subtree completion fetch failed");
                        *incomplete = true;
                    }
                }
            }
            assembly.attach_pending();
        }
    }

    /// Reject assemblies that contradict their own data.
    fn validate(
        assembly: &ThreadAssembly<Status>,
        post: &Status,
        root_id: &str,
        incomplete: bool,
    ) -> Result<(), FediError> {
        if let Some(parent_id) = post.in_reply_to_id.clone()
            && !assembly.contains(&parent_id)
        {
            return Err(FediError::MissingParent {
                id: post.id.clone(),
                parent_id,
            });
        }

        let parentless = assembly.parentless();
        let contested: Vec<String> = parentless
            .iter()
            .filter(|id| id.as_str() != root_id)
            .cloned()
            .collect();
        if !contested.is_empty() {
            let mut candidates = vec![root_id.to_owned()];
            candidates.extend(contested);
            return Err(FediError::NoRoot { candidates });
        }
        if parentless.is_empty() && !incomplete {
            // Every fetch succeeded yet the top of the chain still
            // declares a parent; the thread contradicts itself.
            return Err(FediError::NoRoot {
                candidates: vec![root_id.to_owned()],
            });
        }
        Ok(())
    }

    async fn fetch_status(
        &self,
        host: &str,
        id: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Status, FetchError> {
        let url = api::status_url(host, id)?;
        let request = FetchRequest::get(url)
            .with_bearer(credentials.and_then(|creds| creds.token_for_host(host)));
        fetch_json(self.fetcher.as_ref(), request).await
    }

    async fn fetch_context(
        &self,
        host: &str,
        id: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Context, FetchError> {
        let url = api::context_url(host, id)?;
        let request = FetchRequest::get(url)
            .with_bearer(credentials.and_then(|creds| creds.token_for_host(host)));
        fetch_json(self.fetcher.as_ref(), request).await
    }
}
