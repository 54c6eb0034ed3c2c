//! `skein hn` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use skein_config::{CliSettings, Config};
use skein_fetch::HttpFetcher;
use skein_hn::{HnResolver, ITEM_ENDPOINT, SEARCH_ENDPOINT};

use crate::error::CliError;
use crate::output::Output;
use crate::render::ThreadPrinter;

/// Arguments for the hn command.
#[derive(Args)]
pub(crate) struct HnArgs {
    /// Story id to resolve.
    story_id: u64,

    /// Path to configuration file (default: auto-discover skein.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output (per-fetch logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl HnArgs {
    /// Execute the hn command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the story cannot be
    /// resolved.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            instance: None,
            timeout_secs: self.timeout,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let fetcher = HttpFetcher::with_timeout(config.fetch.timeout_secs)?;
        let resolver = HnResolver::new(Arc::new(fetcher)).with_endpoints(
            config
                .hn
                .search_endpoint
                .as_deref()
                .unwrap_or(SEARCH_ENDPOINT),
            config.hn.item_endpoint.as_deref().unwrap_or(ITEM_ENDPOINT),
        );

        output.info(&format!("Resolving story {}", self.story_id));
        let story = resolver.story(self.story_id).await?;
        if let Some(title) = &story.title {
            output.highlight(title);
        }

        let forest = resolver.resolve_ordered_thread(self.story_id).await?;
        ThreadPrinter::new().print_hn(&forest);

        let total: usize = forest.iter().map(|node| node.descendant_count() + 1).sum();
        output.success(&format!("Resolved {total} comments in display order"));
        Ok(())
    }
}
