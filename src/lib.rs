//! shellrun - run external programs and capture their output
//!
//! Runs a program (or a shell command string) and returns what it wrote to
//! standard output as text:
//! - **Synchronously** on the calling thread via [`Runner`]
//! - **Asynchronously** on an injectable [`WorkerPool`] via [`AsyncShell`],
//!   with an optional completion callback and a cancellable [`TaskHandle`]
//!
//! ## Modes
//!
//! - `Strict` (default) - non-zero exits and invalid UTF-8 are errors
//! - `Compat` - exit status is ignored and undecodable output becomes `""`
//!
//! Arguments and command strings are passed through unescaped. Never feed
//! untrusted input to these functions.
//!
//! ```no_run
//! use shellrun::Runner;
//!
//! let runner = Runner::new()?;
//! let out = runner.run_command("echo hello")?;
//! assert_eq!(out, "hello\n");
//! # Ok::<(), shellrun::ShellError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod platform;

pub use cli::{Cli, Commands};
pub use config::{load_config, Config, ExecMode, PoolConfig, RunnerConfig};
pub use error::{ErrorInfo, ShellError};
pub use executor::{AsyncShell, Invocation, Responder, Runner, TaskHandle, WorkerPool};
pub use platform::{ensure_supported, probe, Capabilities};
