//! Host capability checks
//!
//! Process execution relies on `fork`/`exec` semantics and a POSIX shell
//! reachable through an environment locator such as `/usr/bin/env`. Hosts
//! without those are rejected up front instead of failing mid-call.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::RunnerConfig;
use crate::error::ShellError;

/// Operating systems the runner is known to work on
pub const SUPPORTED_OS: &[&str] = &["linux", "macos"];

/// Whether `os` is one of [`SUPPORTED_OS`]
pub fn is_supported(os: &str) -> bool {
    SUPPORTED_OS.contains(&os)
}

/// Fail fast if the current host cannot run processes
pub fn ensure_supported() -> Result<(), ShellError> {
    check_os(std::env::consts::OS)
}

fn check_os(os: &str) -> Result<(), ShellError> {
    if is_supported(os) {
        Ok(())
    } else {
        tracing::error!(os, "unsupported platform");
        Err(ShellError::UnsupportedPlatform { os: os.to_string() })
    }
}

/// Report of what the host offers
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub os: String,
    pub supported: bool,
    pub env_locator: PathBuf,
    pub env_locator_exists: bool,
    pub shell: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_path: Option<PathBuf>,
}

impl Capabilities {
    /// Whether shell commands can be expected to run
    pub fn ready(&self) -> bool {
        self.supported && self.env_locator_exists && self.shell_path.is_some()
    }
}

/// Inspect the host against a runner configuration
pub fn probe(config: &RunnerConfig) -> Capabilities {
    let os = std::env::consts::OS.to_string();
    let shell_path = match which::which(&config.shell) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!("Shell '{}' not found on PATH: {}", config.shell, e);
            None
        }
    };

    Capabilities {
        supported: is_supported(&os),
        os,
        env_locator: config.env_locator.clone(),
        env_locator_exists: config.env_locator.exists(),
        shell: config.shell.clone(),
        shell_path,
    }
}
