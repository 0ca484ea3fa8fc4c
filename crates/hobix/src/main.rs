//! Hobix CLI - weblog engine.
//!
//! Provides commands for:
//! - `regen`: Regenerate every page of the site
//! - `upgen`: Regenerate the pages one entry affects
//! - `list`: List stored entries
//! - `post`: Create or edit an entry in `$EDITOR`
//! - `delete`: Remove an entry and update the site

mod commands;
mod editor;
mod error;
mod output;
mod plugins;
mod project;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{DeleteArgs, ListArgs, PostArgs, RegenArgs, UpgenArgs};
use output::Output;

/// Hobix - weblog engine.
#[derive(Parser)]
#[command(name = "hobix", version, about)]
struct Cli {
    /// Enable informational logging (otherwise RUST_LOG decides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate every page.
    Regen(RegenArgs),
    /// Regenerate the pages affected by one entry.
    Upgen(UpgenArgs),
    /// List entries, newest first.
    List(ListArgs),
    /// Create or edit an entry.
    Post(PostArgs),
    /// Delete an entry.
    Delete(DeleteArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Regen(args) => args.execute(),
        Commands::Upgen(args) => args.execute(),
        Commands::List(args) => args.execute(),
        Commands::Post(args) => args.execute(),
        Commands::Delete(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
