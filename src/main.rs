use anyhow::Result;
use clap::Parser;

use riparian::cli::{Cli, Commands};
use riparian::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Analyze(args) => commands::analyze(&cli, args),
    }
}
