//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Discover and run mage targets.
///
/// Finds targets in magefiles/ or magefile.go without compiling them and hands
/// execution off to mage, or to `go run` when mage is not installed.
#[derive(Parser, Debug)]
#[command(name = "magefilehub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "MAGEFILEHUB_VERBOSE")]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root (defaults to current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a target through mage or go run
    Run(RunArgs),

    /// List targets found in the magefile
    List(ListArgs),

    /// Search targets by name or description
    Search(SearchArgs),

    /// Show where the magefile lives
    Locate(LocateArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Create a starter magefile.go
    Init,
}

/// Arguments for the `run` subcommand
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Target name (e.g., deploy, build:linux)
    #[arg(required = true)]
    pub target: String,

    /// Arguments exposed to the target through MAGE_ARGS
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Timeout in seconds (overrides configuration)
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Arguments for the `list` subcommand
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Only show targets in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Group targets under their namespace
    #[arg(short, long)]
    pub grouped: bool,
}

/// Arguments for the `search` subcommand
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Text to look for, case-insensitive
    #[arg(required = true)]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `locate` subcommand
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text (one entry per line)
    Plain,
}
