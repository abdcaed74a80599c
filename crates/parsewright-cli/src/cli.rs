//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parsewright - generate and verify bank statement parsers.
#[derive(Debug, Parser)]
#[command(name = "parsewright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "PARSEWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate, verify and persist a parser for a profile
    Run(RunArgs),

    /// Re-run a persisted parser and validate it against the ground truth
    Check(TargetArgs),

    /// Print the manifest of a persisted parser
    Show(TargetArgs),

    /// List profiles under the data directory
    Profiles,
}

/// Profile selection.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Profile id (e.g. icici)
    #[arg(short, long, env = "PARSEWRIGHT_TARGET")]
    pub target: String,
}

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Override the configured attempt budget
    #[arg(long)]
    pub max_attempts: Option<u32>,
}
