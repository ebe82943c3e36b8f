//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE;

/// Merge, sprite and minify stylesheets into one content-addressed artifact
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: reduce.toml)
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Reduce a `::`-separated list of stylesheet urls and print the result url
    #[command(visible_alias = "r")]
    Reduce {
        #[command(flatten)]
        args: ReduceArgs,
    },

    /// Show the key, signature and file name encoded in a reduced url
    #[command(visible_alias = "i")]
    Inspect {
        /// Reduced stylesheet or sprite url
        url: String,
    },
}

/// Reduce command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ReduceArgs {
    /// Stylesheet urls joined by `::`, in page order
    #[arg(value_name = "URLS")]
    pub urls: String,

    /// Name the artifact after this 32-digit hex key instead of the input fingerprint
    #[arg(short, long)]
    pub key: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
