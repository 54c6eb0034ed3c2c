//! Canonical origin derivation.

use url::Url;

use crate::types::Status;

/// Federation-canonical identity of a post: the authoritative host and
/// the post's id in that host's id space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub host: String,
    pub id: String,
}

/// Derive the canonical origin of a status from its ActivityPub `uri`.
///
/// A Mastodon-style uri such as
/// `https://fosstodon.org/users/ada/statuses/109372829` names the origin
/// host, and its last path segment is the status id on that host. Returns
/// `None` when the uri has no host or its last segment is not a numeric
/// id; other server software mints differently shaped identifiers whose
/// last segment is not addressable through the status endpoints, and
/// those threads are resolved via the serving host instead.
#[must_use]
pub fn derive_origin(status: &Status) -> Option<Origin> {
    let url = Url::parse(&status.uri).ok()?;
    let host = url.host_str()?.to_owned();
    let id = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?;
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(Origin {
        host,
        id: id.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{Account, Status};

    fn status_with_uri(uri: &str) -> Status {
        Status {
            id: "1".to_owned(),
            uri: uri.to_owned(),
            url: None,
            in_reply_to_id: None,
            account: Account {
                id: "1".to_owned(),
                acct: "ada".to_owned(),
                display_name: String::new(),
            },
            content: String::new(),
            spoiler_text: String::new(),
            created_at: chrono::DateTime::UNIX_EPOCH,
            replies_count: 0,
            reblogs_count: 0,
            favourites_count: 0,
            reblog: None,
        }
    }

    #[test]
    fn test_mastodon_style_uri() {
        let status = status_with_uri("https://fosstodon.org/users/ada/statuses/109372829");

        let origin = derive_origin(&status).unwrap();

        assert_eq!(origin.host, "fosstodon.org");
        assert_eq!(origin.id, "109372829");
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        let status = status_with_uri("https://fosstodon.org/users/ada/statuses/109372829/");

        let origin = derive_origin(&status).unwrap();

        assert_eq!(origin.id, "109372829");
    }

    #[test]
    fn test_non_numeric_object_id_is_not_an_origin() {
        // Pleroma-style object uri; its UUID is not a status id.
        let status = status_with_uri(
            "https://pleroma.example/objects/04aa0699-f172-4c68-8f28-a4a2e47eb0b3",
        );

        assert!(derive_origin(&status).is_none());
    }

    #[test]
    fn test_tag_uri_has_no_host() {
        let status = status_with_uri("tag:gnusocial.example,2019-08-02:noticeId=1234");

        assert!(derive_origin(&status).is_none());
    }

    #[test]
    fn test_unparsable_uri() {
        let status = status_with_uri("not a uri at all");

        assert!(derive_origin(&status).is_none());
    }
}
