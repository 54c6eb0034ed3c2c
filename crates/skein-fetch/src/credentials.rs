//! Viewer credentials scoped to a single home instance.
//!
//! A bearer token is only ever released for requests that target the
//! host it was issued by. Requests to any other host go out anonymous.

use std::fmt;

/// Credentials for a viewer account on one instance.
///
/// The token is private and never printed; [`fmt::Debug`] redacts it.
pub struct Credentials {
    acct: String,
    instance: String,
    token: String,
}

impl Credentials {
    /// Create credentials for `acct` on `instance` with a bearer `token`.
    ///
    /// `instance` is a bare hostname such as `fosstodon.org`.
    #[must_use]
    pub fn new(
        acct: impl Into<String>,
        instance: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            acct: acct.into(),
            instance: instance.into(),
            token: token.into(),
        }
    }

    /// The viewer's account name, without a leading `@`.
    #[must_use]
    pub fn acct(&self) -> &str {
        &self.acct
    }

    /// The home instance hostname the token belongs to.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Release the token for `host`, or `None` if `host` is not the
    /// home instance. Comparison is case-insensitive.
    #[must_use]
    pub fn token_for_host(&self, host: &str) -> Option<&str> {
        if host.eq_ignore_ascii_case(&self.instance) {
            Some(&self.token)
        } else {
            None
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("acct", &self.acct)
            .field("instance", &self.instance)
            .field("token", &"<redacted>")
            .finish()
    }
}
