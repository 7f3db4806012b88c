//! Prismatic CLI - code block and diagram post-processor.
//!
//! Provides commands for:
//! - `render`: Normalize code blocks and render diagram toggles in an HTML page
//! - `inspect`: List code block languages and diagram blocks without changing anything

mod commands;
mod error;
mod output;
mod pipeline;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{InspectArgs, RenderArgs};
use error::CliError;
use output::Output;

/// Prismatic - code block and diagram post-processor.
#[derive(Parser)]
#[command(name = "prismatic", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an HTML page and write the result.
    Render(RenderArgs),
    /// List code blocks and diagrams found in an HTML page.
    Inspect(InspectArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => run_async(args.execute()),
        Commands::Inspect(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run_async(
    future: impl std::future::Future<Output = Result<(), CliError>>,
) -> Result<(), CliError> {
    tokio::runtime::Runtime::new()?.block_on(future)
}
