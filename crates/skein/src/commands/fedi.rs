//! `skein fedi` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use skein_config::{CliSettings, Config, FediConfig};
use skein_fedi::FediResolver;
use skein_fetch::{Credentials, HttpFetcher};
use url::Url;

use crate::error::CliError;
use crate::output::Output;
use crate::render::ThreadPrinter;

/// Arguments for the fedi command.
#[derive(Args)]
pub(crate) struct FediArgs {
    /// Post to resolve: a status URL or a numeric status id.
    post: String,

    /// Path to configuration file (default: auto-discover skein.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Instance the status id belongs to (overrides config).
    #[arg(short, long)]
    instance: Option<String>,

    /// Per-request timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Resolve anonymously even when credentials are configured.
    #[arg(long)]
    anonymous: bool,

    /// Enable verbose output (per-fetch logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl FediArgs {
    /// Execute the fedi command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the post reference cannot
    /// be parsed, or the thread cannot be resolved.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            instance: self.instance,
            timeout_secs: self.timeout,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let (host, post_id) = match parse_post_target(&self.post)? {
            PostTarget::Url { host, id } => (host, id),
            // A bare id is meaningless without an instance to scope it.
            PostTarget::Id(id) => (config.require_fedi()?.instance.clone(), id),
        };

        let credentials = if self.anonymous {
            None
        } else {
            credentials_from(config.fedi.as_ref())
        };
        if let Some(creds) = &credentials {
            output.info(&format!(
                "Authenticated as @{}@{}",
                creds.acct(),
                creds.instance()
            ));
        }
        output.info(&format!("Resolving thread for post {post_id} on {host}"));

        let fetcher = HttpFetcher::with_timeout(config.fetch.timeout_secs)?;
        let resolver = FediResolver::new(Arc::new(fetcher));
        let thread = resolver.resolve(&post_id, &host, credentials.as_ref()).await?;

        ThreadPrinter::new().print_fedi(&thread);

        if thread.possibly_incomplete {
            output.warning("Thread may be incomplete: not every source could be fully queried");
        }
        output.success(&format!(
            "Resolved {} replies via {}",
            thread.root.descendant_count(),
            thread.origin_instance
        ));
        Ok(())
    }
}

/// A parsed post reference from the command line.
#[derive(Debug)]
enum PostTarget {
    /// A status URL; the id lives in that host's id space.
    Url { host: String, id: String },
    /// A bare status id; the instance must come from config or flags.
    Id(String),
}

/// Parse the positional post argument.
///
/// Accepts the web URL of a status (`https://host/@user/123` or
/// `https://host/users/u/statuses/123`) or a bare numeric id.
fn parse_post_target(post: &str) -> Result<PostTarget, CliError> {
    if post.starts_with("http://") || post.starts_with("https://") {
        let url = Url::parse(post)
            .map_err(|err| CliError::Validation(format!("invalid post URL: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| CliError::Validation("post URL has no host".to_owned()))?
            .to_owned();
        let id = url
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).next_back())
            .unwrap_or_default();
        if id.is_empty() || !id.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(CliError::Validation(format!(
                "could not extract a numeric status id from {post}"
            )));
        }
        return Ok(PostTarget::Url {
            host,
            id: id.to_owned(),
        });
    }
    if !post.is_empty() && post.chars().all(|ch| ch.is_ascii_digit()) {
        return Ok(PostTarget::Id(post.to_owned()));
    }
    Err(CliError::Validation(format!(
        "expected a status URL or a numeric status id, got {post}"
    )))
}

/// Build credentials when the config carries a complete pair.
fn credentials_from(fedi: Option<&FediConfig>) -> Option<Credentials> {
    let fedi = fedi?;
    match (&fedi.acct, &fedi.token) {
        (Some(acct), Some(token)) => Some(Credentials::new(acct, &fedi.instance, token)),
        _ => None,
    }
}
