//! CLI error types.

use skein_config::ConfigError;
use skein_fedi::FediError;
use skein_fetch::FetchError;
use skein_hn::HnError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Fedi(#[from] FediError),

    #[error("{0}")]
    Hn(#[from] HnError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Validation(String),
}
