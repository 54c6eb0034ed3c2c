//! Client API endpoints.
//!
//! Instances are addressed by bare hostname; every endpoint is https.

use url::Url;

/// Endpoint serving a single status.
pub(crate) fn status_url(host: &str, id: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("https://{host}/api/v1/statuses/{id}"))
}

/// Endpoint serving a status's ancestors and descendants in one call.
pub(crate) fn context_url(host: &str, id: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("https://{host}/api/v1/statuses/{id}/context"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url() {
        let url = status_url("fosstodon.org", "109372829").unwrap();

        assert_eq!(
            url.as_str(),
            "https://fosstodon.org/api/v1/statuses/109372829"
        );
    }

    #[test]
    fn test_context_url() {
        let url = context_url("fosstodon.org", "109372829").unwrap();

        assert_eq!(
            url.as_str(),
            "https://fosstodon.org/api/v1/statuses/109372829/context"
        );
    }
}
