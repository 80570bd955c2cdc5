//! CLI module for shellrun
//!
//! Provides command-line interface with the following subcommands:
//! - `exec` - Run a program with arguments
//! - `sh` - Run a shell command string
//! - `spawn` - Run shell commands concurrently on the worker pool
//! - `check` - Report host capabilities
//! - `config` - Show configuration

pub mod commands;

pub use commands::{Cli, Commands};
