//! skein CLI - Discussion thread reader.
//!
//! Provides commands for:
//! - `fedi`: Resolve a federated post into its complete reply tree
//! - `hn`: Resolve a Hacker News story into its ordered comment tree

mod commands;
mod error;
mod output;
mod render;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{FediArgs, HnArgs};
use output::Output;

/// skein - Discussion thread reader.
#[derive(Parser)]
#[command(name = "skein", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a federated post's thread across instances.
    Fedi(FediArgs),
    /// Resolve a Hacker News story's comments in display order.
    Hn(HnArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Fedi(args) => args.verbose,
        Commands::Hn(args) => args.verbose,
    };

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = match cli.command {
        Commands::Fedi(args) => rt.block_on(args.execute()),
        Commands::Hn(args) => rt.block_on(args.execute()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
