#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter for the Delve simulation core.
//!
//! `delve generate` regenerates a map from its seed and prints it, and
//! `delve simulate` drives a room for a fixed number of ticks while writing
//! every outbound event to stdout as one JSON object per line. Logs go to
//! stderr so stdout stays machine readable.

mod generate;
mod simulate;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Headless tools for the Delve simulation core.
#[derive(Debug, Parser)]
#[command(name = "delve", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Regenerate a dungeon from its seed and print it.
    Generate(generate::GenerateArgs),
    /// Run a room headlessly and print its events as JSON lines.
    Simulate(simulate::SimulateArgs),
}

/// Entry point for the Delve command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Generate(args) => generate::run(&args, &mut out),
        Command::Simulate(args) => simulate::run(&args, &mut out),
    }
}
