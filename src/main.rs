//! css-reduce - stylesheet reduction and spriting.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use css_reduce::cli::{self, Cli, Commands};
use css_reduce::config::ReduceConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Reduce { args } => {
            let config = ReduceConfig::load(&cli.config)?;
            cli::reduce::run_reduce(args, &config)
        }
        Commands::Inspect { url } => {
            cli::inspect::inspect_url(url);
            Ok(())
        }
    }
}
