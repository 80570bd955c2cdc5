//! Process execution with stdout capture
//!
//! Spawns a program (or a shell command string), waits for it to exit and
//! returns what it wrote to standard output. Standard error and standard
//! input are inherited from the parent. Arguments are passed verbatim with
//! no quoting, so callers own injection safety.
//!
//! Captured output is interpreted according to [`ExecMode`]:
//! - `Strict` reports non-zero exits and invalid UTF-8 as errors
//! - `Compat` ignores the exit status and turns invalid UTF-8 into `""`

use std::fmt;
use std::process::{ExitStatus, Stdio};

use serde::Serialize;

use crate::config::{ExecMode, RunnerConfig};
use crate::error::ShellError;
use crate::platform;

/// Something to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Invocation {
    /// A program path and its arguments
    Program { program: String, args: Vec<String> },
    /// A command string handed to the shell
    Shell(String),
}

impl Invocation {
    /// Program with arguments
    pub fn program<S: AsRef<str>>(program: impl Into<String>, args: &[S]) -> Self {
        Invocation::Program {
            program: program.into(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
        }
    }

    /// Command string interpreted by the shell
    pub fn shell(command: impl Into<String>) -> Self {
        Invocation::Shell(command.into())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Program { program, args } => write!(f, "{}", command_line(program, args)),
            Invocation::Shell(command) => write!(f, "{}", command),
        }
    }
}

fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Runs processes and captures their standard output
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Runner with default configuration
    ///
    /// # Errors
    /// * `ShellError::UnsupportedPlatform` - If the host OS is not supported
    pub fn new() -> Result<Self, ShellError> {
        Self::from_config(RunnerConfig::default())
    }

    /// Runner that ignores exit status and degrades undecodable output to `""`
    pub fn compat() -> Result<Self, ShellError> {
        Self::from_config(RunnerConfig::default().with_mode(ExecMode::Compat))
    }

    /// Runner from explicit configuration
    ///
    /// # Errors
    /// * `ShellError::UnsupportedPlatform` - If the host OS is not supported
    pub fn from_config(config: RunnerConfig) -> Result<Self, ShellError> {
        platform::ensure_supported()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn mode(&self) -> ExecMode {
        self.config.mode
    }

    /// Program and argument vector an invocation launches
    ///
    /// A shell command `cmd` resolves to `<env_locator> <shell> -c cmd`.
    pub fn resolve(&self, invocation: &Invocation) -> (String, Vec<String>) {
        match invocation {
            Invocation::Program { program, args } => (program.clone(), args.clone()),
            Invocation::Shell(command) => (
                self.config.env_locator.to_string_lossy().to_string(),
                vec![self.config.shell.clone(), "-c".to_string(), command.clone()],
            ),
        }
    }

    /// Run `program` with `args` and return its standard output
    ///
    /// Blocks the calling thread until the child has exited.
    ///
    /// # Errors
    /// * `ShellError::SpawnFailed` - If the program couldn't be launched
    /// * `ShellError::NonZeroExit` - Strict mode, child exited unsuccessfully
    /// * `ShellError::Decode` - Strict mode, output was not UTF-8
    pub fn run<S: AsRef<str>>(&self, program: &str, args: &[S]) -> Result<String, ShellError> {
        self.execute(&Invocation::program(program, args))
    }

    /// Run the default program (the environment locator) with `args`
    pub fn run_default<S: AsRef<str>>(&self, args: &[S]) -> Result<String, ShellError> {
        let program = self.config.env_locator.to_string_lossy().to_string();
        self.execute(&Invocation::program(program, args))
    }

    /// Run a command string through the shell
    pub fn run_command(&self, command: &str) -> Result<String, ShellError> {
        self.execute(&Invocation::shell(command))
    }

    /// Run an invocation on the calling thread
    pub fn execute(&self, invocation: &Invocation) -> Result<String, ShellError> {
        let (program, args) = self.resolve(invocation);
        let command_str = command_line(&program, &args);

        tracing::debug!("Executing: {}", command_str);

        let child = std::process::Command::new(&program)
            .args(&args)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| ShellError::SpawnFailed {
                command: command_str.clone(),
                error: e.to_string(),
            })?;

        // Reads stdout to EOF while waiting so a full pipe cannot stall the child
        let output = child.wait_with_output()?;

        capture_output(self.config.mode, command_str, output.status, output.stdout)
    }

    /// Run an invocation without blocking the executor thread
    ///
    /// The child is killed if the returned future is dropped before it
    /// completes.
    pub async fn execute_async(&self, invocation: &Invocation) -> Result<String, ShellError> {
        let (program, args) = self.resolve(invocation);
        let command_str = command_line(&program, &args);

        tracing::debug!("Executing async: {}", command_str);

        let child = tokio::process::Command::new(&program)
            .args(&args)
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ShellError::SpawnFailed {
                command: command_str.clone(),
                error: e.to_string(),
            })?;

        let output = child.wait_with_output().await?;

        capture_output(self.config.mode, command_str, output.status, output.stdout)
    }
}

/// Turn a finished child's status and stdout bytes into the result text
pub fn capture_output(
    mode: ExecMode,
    command: String,
    status: ExitStatus,
    stdout: Vec<u8>,
) -> Result<String, ShellError> {
    match mode {
        ExecMode::Compat => {
            if !status.success() {
                tracing::debug!("Ignoring exit status {} of: {}", status, command);
            }
            Ok(String::from_utf8(stdout).unwrap_or_else(|e| {
                tracing::debug!("Discarding non-UTF-8 output of {}: {}", command, e);
                String::new()
            }))
        }
        ExecMode::Strict => {
            if !status.success() {
                return Err(ShellError::NonZeroExit {
                    command,
                    exit_code: status.code(),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                });
            }
            String::from_utf8(stdout).map_err(|error| ShellError::Decode { command, error })
        }
    }
}
