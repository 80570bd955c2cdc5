//! Error types for shellrun
//!
//! Provides structured error types with suggestions for common issues.

use serde::Serialize;
use thiserror::Error;

/// Main error type for process execution
#[derive(Error, Debug)]
pub enum ShellError {
    /// Host OS cannot run processes the way the runner expects
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// Failed to spawn the command
    #[error("Failed to spawn command: {command}")]
    SpawnFailed { command: String, error: String },

    /// Command exited unsuccessfully (strict mode only)
    #[error("Command exited with status {}: {command}", fmt_exit_code(*exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
    },

    /// Standard output was not valid UTF-8 (strict mode only)
    #[error("Output of '{command}' is not valid UTF-8")]
    Decode {
        command: String,
        #[source]
        error: std::string::FromUtf8Error,
    },

    /// Task was cancelled before it delivered a result
    #[error("Task {task} was cancelled")]
    Cancelled { task: u64 },

    /// Completion callback panicked after the command ran
    #[error("Callback of task {task} panicked: {message}")]
    TaskPanicked { task: u64, message: String },

    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Serializable error info for JSON output
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl ShellError {
    /// Stable machine-readable name for the error kind
    pub fn error_type(&self) -> &'static str {
        match self {
            ShellError::UnsupportedPlatform { .. } => "unsupported_platform",
            ShellError::SpawnFailed { .. } => "spawn_failed",
            ShellError::NonZeroExit { .. } => "non_zero_exit",
            ShellError::Decode { .. } => "decode_failed",
            ShellError::Cancelled { .. } => "cancelled",
            ShellError::TaskPanicked { .. } => "task_panicked",
            ShellError::Pool(_) => "pool_error",
            ShellError::Config(_) => "config_error",
            ShellError::Io(_) => "io_error",
        }
    }
}

impl From<&ShellError> for ErrorInfo {
    fn from(err: &ShellError) -> Self {
        let (exit_code, stdout) = match err {
            ShellError::NonZeroExit {
                exit_code, stdout, ..
            } => (*exit_code, Some(stdout.clone())),
            _ => (None, None),
        };

        ErrorInfo {
            message: err.to_string(),
            error_type: err.error_type().to_string(),
            suggestion: suggest_fix(err),
            exit_code,
            stdout,
        }
    }
}

/// Suggest fixes for common error patterns
pub fn suggest_fix(err: &ShellError) -> Option<String> {
    match err {
        ShellError::UnsupportedPlatform { os } => Some(format!(
            "'{}' is not supported. Run on Linux or macOS.",
            os
        )),
        ShellError::SpawnFailed { command, error } => {
            if error.contains("No such file") || error.contains("not found") {
                if command.starts_with("/usr/bin/env") {
                    return Some(
                        "Shell environment locator missing. Set [runner].env_locator in your config."
                            .to_string(),
                    );
                }
                return Some("Program not found. Check the path and PATH.".to_string());
            }
            if error.contains("Permission denied") {
                return Some(
                    "Permission denied. Check that the program is executable.".to_string(),
                );
            }
            None
        }
        ShellError::NonZeroExit { .. } => Some(
            "Use compat mode (--mode compat) to capture output regardless of exit status."
                .to_string(),
        ),
        ShellError::Decode { .. } => Some(
            "Output contains non-UTF-8 bytes. Compat mode returns an empty string instead."
                .to_string(),
        ),
        ShellError::Config(_) => Some("Check your shellrun configuration file".to_string()),
        ShellError::TaskPanicked { .. } => Some(
            "The completion callback panicked; the command itself ran.".to_string(),
        ),
        ShellError::Cancelled { .. } | ShellError::Pool(_) | ShellError::Io(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_error() {
        let err = ShellError::UnsupportedPlatform {
            os: "windows".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported platform: windows");

        let info = ErrorInfo::from(&err);
        assert_eq!(info.error_type, "unsupported_platform");
        assert!(info.suggestion.unwrap().contains("Linux or macOS"));
    }

    #[test]
    fn test_non_zero_exit_error() {
        let err = ShellError::NonZeroExit {
            command: "/usr/bin/env bash -c exit 3".to_string(),
            exit_code: Some(3),
            stdout: "partial\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command exited with status 3: /usr/bin/env bash -c exit 3"
        );

        let info = ErrorInfo::from(&err);
        assert_eq!(info.exit_code, Some(3));
        assert_eq!(info.stdout, Some("partial\n".to_string()));
    }

    #[test]
    fn test_non_zero_exit_by_signal() {
        let err = ShellError::NonZeroExit {
            command: "sleep 10".to_string(),
            exit_code: None,
            stdout: String::new(),
        };
        assert!(err.to_string().contains("status signal"));
    }

    #[test]
    fn test_decode_error_has_source() {
        let error = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err = ShellError::Decode {
            command: "printf".to_string(),
            error,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.error_type(), "decode_failed");
    }

    #[test]
    fn test_cancelled_error() {
        let err = ShellError::Cancelled { task: 7 };
        assert_eq!(err.to_string(), "Task 7 was cancelled");
        assert!(suggest_fix(&err).is_none());
    }

    #[test]
    fn test_task_panicked_error() {
        let err = ShellError::TaskPanicked {
            task: 3,
            message: "callback bug".to_string(),
        };
        assert_eq!(err.to_string(), "Callback of task 3 panicked: callback bug");

        let info = ErrorInfo::from(&err);
        assert_eq!(info.error_type, "task_panicked");
        assert!(info.suggestion.is_some());
    }

    #[test]
    fn test_suggest_fix_missing_program() {
        let err = ShellError::SpawnFailed {
            command: "nonexistent_program".to_string(),
            error: "No such file or directory (os error 2)".to_string(),
        };
        assert!(suggest_fix(&err).unwrap().contains("Program not found"));
    }

    #[test]
    fn test_suggest_fix_missing_env_locator() {
        let err = ShellError::SpawnFailed {
            command: "/usr/bin/env bash -c true".to_string(),
            error: "No such file or directory (os error 2)".to_string(),
        };
        assert!(suggest_fix(&err).unwrap().contains("env_locator"));
    }

    #[test]
    fn test_suggest_fix_permission_denied() {
        let err = ShellError::SpawnFailed {
            command: "./script.sh".to_string(),
            error: "Permission denied (os error 13)".to_string(),
        };
        assert!(suggest_fix(&err).unwrap().contains("executable"));
    }

    #[test]
    fn test_error_info_serialization() {
        let err = ShellError::Config("bad mode".to_string());
        let json = serde_json::to_string(&ErrorInfo::from(&err)).unwrap();
        assert!(json.contains("config_error"));
        assert!(json.contains("bad mode"));
    }

    #[test]
    fn test_error_info_skips_empty_fields() {
        let err = ShellError::Pool("no threads".to_string());
        let json = serde_json::to_string(&ErrorInfo::from(&err)).unwrap();
        assert!(!json.contains("suggestion"));
        assert!(!json.contains("exit_code"));
        assert!(!json.contains("stdout"));
    }
}
