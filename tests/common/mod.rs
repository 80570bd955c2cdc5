//! Common test utilities for shellrun tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use shellrun::{AsyncShell, ExecMode, PoolConfig, Runner, RunnerConfig, WorkerPool};
use tempfile::TempDir;

/// Runner with the given mode and default shell
pub fn runner(mode: ExecMode) -> Runner {
    Runner::from_config(RunnerConfig::default().with_mode(mode)).expect("Unsupported platform")
}

/// Async shell on its own small pool
pub fn async_shell(mode: ExecMode) -> AsyncShell {
    let pool = WorkerPool::new(&PoolConfig::default().with_workers(2)).expect("Failed to start pool");
    AsyncShell::new(runner(mode), pool).with_shutdown_timeout(Duration::from_secs(1))
}

/// Creates a temporary directory and a path for a not-yet-written file in it
pub fn scratch_file(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}

/// Strip line endings the way callers are expected to
pub fn trim_newlines(s: &str) -> &str {
    s.trim_matches(['\n', '\r'])
}

/// Shell snippet that writes bytes which are not valid UTF-8
pub const INVALID_UTF8_COMMAND: &str = r"printf 'ok\377\376'";
