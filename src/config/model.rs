//! Configuration model for shellrun
//!
//! Defines the structure for XDG-compliant layered configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ShellError;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// How programs and shell commands are launched
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Worker pool used for asynchronous execution
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Config {
    /// Apply path expansion and reject settings no runner can use
    pub fn resolved(self) -> Result<Self, ShellError> {
        Ok(Self {
            runner: self.runner.resolved()?,
            pool: self.pool,
        })
    }
}

/// How captured output is interpreted
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Non-zero exits and invalid UTF-8 are reported as errors
    #[default]
    Strict,
    /// Exit status is ignored and undecodable output becomes an empty string
    Compat,
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecMode::Strict => write!(f, "strict"),
            ExecMode::Compat => write!(f, "compat"),
        }
    }
}

impl std::str::FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ExecMode::Strict),
            "compat" | "compatible" => Ok(ExecMode::Compat),
            other => Err(format!(
                "invalid mode '{}': expected 'strict' or 'compat'",
                other
            )),
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RunnerConfig {
    /// Default program, used to locate the shell on PATH
    #[serde(default = "default_env_locator")]
    pub env_locator: PathBuf,

    /// Shell that interprets command strings
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Output interpretation policy
    #[serde(default)]
    pub mode: ExecMode,
}

fn default_env_locator() -> PathBuf {
    PathBuf::from("/usr/bin/env")
}

fn default_shell() -> String {
    "bash".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            env_locator: default_env_locator(),
            shell: default_shell(),
            mode: ExecMode::default(),
        }
    }
}

impl RunnerConfig {
    /// Create a runner config with the given mode
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the shell used for command strings
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the default program
    pub fn with_env_locator(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_locator = path.into();
        self
    }

    /// Expand `~` and `$VARS` in the env locator and check the shell name
    ///
    /// # Errors
    /// * `ShellError::Config` - If a variable is undefined or the shell is blank
    pub fn resolved(mut self) -> Result<Self, ShellError> {
        let raw = self.env_locator.to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw).map_err(|e| {
            ShellError::Config(format!("cannot expand env_locator '{}': {}", raw, e))
        })?;
        self.env_locator = PathBuf::from(expanded.as_ref());

        if self.shell.trim().is_empty() {
            return Err(ShellError::Config(
                "runner.shell must name a shell".to_string(),
            ));
        }

        Ok(self)
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PoolConfig {
    /// Number of worker threads (0 = one per core)
    #[serde(default)]
    pub workers: usize,

    /// Name given to pool threads
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// How long shutdown waits for running tasks, in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_thread_name() -> String {
    "shellrun-worker".to_string()
}

fn default_shutdown_timeout() -> u64 {
    5
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            thread_name: default_thread_name(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl PoolConfig {
    /// Set the number of worker threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Shutdown timeout as a duration
    pub fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_timeout_secs)
    }
}
