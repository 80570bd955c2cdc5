//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ExecMode;
use crate::logging::LogFormat;

/// Run programs and shell commands and print what they write to stdout.
///
/// Commands can run on the calling thread or concurrently on a worker pool.
#[derive(Parser, Debug)]
#[command(name = "shellrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output policy (overrides runner.mode from config)
    #[arg(short, long, global = true, value_parser = parse_mode)]
    pub mode: Option<ExecMode>,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a program with arguments and print its output
    Exec(ExecArgs),

    /// Run a command string through the shell
    Sh(ShArgs),

    /// Run several shell commands concurrently on the worker pool
    Spawn(SpawnArgs),

    /// Check whether this host can run commands
    Check(CheckArgs),

    /// Show resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the `exec` subcommand
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Program to run
    #[arg(required = true)]
    pub program: String,

    /// Arguments passed verbatim to the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Strip trailing newlines from the output
    #[arg(short, long)]
    pub trim: bool,
}

/// Arguments for the `sh` subcommand
#[derive(Parser, Debug)]
pub struct ShArgs {
    /// Command string, interpreted literally by the shell
    #[arg(required = true)]
    pub command: String,

    /// Strip trailing newlines from the output
    #[arg(short, long)]
    pub trim: bool,
}

/// Arguments for the `spawn` subcommand
#[derive(Parser, Debug)]
pub struct SpawnArgs {
    /// Command strings to run concurrently
    #[arg(required = true, num_args = 1..)]
    pub commands: Vec<String>,

    /// Worker threads (overrides pool.workers from config)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Arguments for the `check` subcommand
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
}

/// Config output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

fn parse_mode(s: &str) -> Result<ExecMode, String> {
    s.parse()
}
