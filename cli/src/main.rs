use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod downloads;
mod output;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GeneratePaths(args) => commands::generate_paths::run(args),
        Commands::ShowConfig(args) => commands::show_config::run(args),
        Commands::Download(args) => commands::download::run(args),
    }
}
