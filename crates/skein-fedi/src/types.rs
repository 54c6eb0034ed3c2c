//! Client API payload types.
//!
//! Read-only subsets of the JSON the instances serve. Unknown fields are
//! ignored; fields individual servers omit carry defaults so one strict
//! server cannot fail a whole thread.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use skein_thread::ThreadItem;

/// Account that authored a status.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Server-local account id.
    pub id: String,
    /// Webfinger-style handle; local accounts omit the domain.
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
}

/// One post, as served by the client API.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// Id in the serving server's id space. The same post has a different
    /// id on every server that carries a copy.
    pub id: String,
    /// ActivityPub canonical identifier; names the origin server.
    pub uri: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Parent post id, in the serving server's id space.
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    pub account: Account,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub spoiler_text: String,
    pub created_at: DateTime<Utc>,
    /// The serving server's claim of direct reply count. Federation makes
    /// this a hint, not a promise.
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    /// Present when this status is a boost of another status.
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
}

impl ThreadItem for Status {
    type Id = String;

    fn item_id(&self) -> String {
        self.id.clone()
    }

    fn parent_id(&self) -> Option<String> {
        self.in_reply_to_id.clone()
    }

    fn reply_count_hint(&self) -> Option<u64> {
        Some(self.replies_count)
    }
}

/// A post's ancestors and descendants, bundled in one call.
///
/// Ancestors run top down: the first element is the earliest known
/// ancestor, the last is the pivot post's direct parent. Descendants run
/// in the server's thread order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub ancestors: Vec<Status>,
    #[serde(default)]
    pub descendants: Vec<Status>,
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Mention,
    Status,
    Reblog,
    Favourite,
    Follow,
    FollowRequest,
    Poll,
    Update,
    /// Kinds newer servers add; carried through without interpretation.
    #[serde(other)]
    Other,
}

/// One notification, as served by the client API.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub account: Account,
    /// The subject post, for kinds that have one.
    #[serde(default)]
    pub status: Option<Status>,
}

/// A fetched post reference, classified by the payload shape it arrived in.
///
/// The client API serves "something to view" in three shapes: a plain
/// post, a boost republishing another post, and a notification wrapping a
/// post. Classification happens once here; downstream code matches
/// exhaustively instead of probing fields.
#[derive(Debug, Clone)]
pub enum FetchedRef {
    /// A plain post payload.
    Post(Box<Status>),
    /// A boost; the wrapped target is the post to actually view.
    Boost {
        wrapper: Box<Status>,
        target: Box<Status>,
    },
    /// A notification whose subject is a post.
    Notification {
        kind: NotificationKind,
        status: Box<Status>,
    },
}

impl FetchedRef {
    /// Classify a status payload as a plain post or a boost.
    #[must_use]
    pub fn from_status(mut status: Status) -> Self {
        if let Some(target) = status.reblog.take() {
            Self::Boost {
                wrapper: Box::new(status),
                target,
            }
        } else {
            Self::Post(Box::new(status))
        }
    }

    /// Classify a notification payload.
    ///
    /// Returns `None` for kinds without a post subject (follows and the
    /// like); there is nothing to view for those.
    #[must_use]
    pub fn from_notification(notification: Notification) -> Option<Self> {
        let status = notification.status?;
        let target = Self::from_status(status).into_view_target();
        Some(Self::Notification {
            kind: notification.kind,
            status: Box::new(target),
        })
    }

    /// The post the viewer should land on.
    ///
    /// Boosts dereference to their target; the other shapes view the post
    /// they carry.
    #[must_use]
    pub fn into_view_target(self) -> Status {
        match self {
            Self::Post(status) | Self::Notification { status, .. } => *status,
            Self::Boost { target, .. } => *target,
        }
    }
}
