//! Error types for magefilehub
//!
//! Provides structured error types with suggestions for common issues.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Errors produced while delegating a target to mage or `go run`
#[derive(Error, Debug)]
pub enum DelegateError {
    /// Target is unknown and there is no magefile to delegate to
    #[error("command not found and no magefile.go exists: {command}")]
    CommandNotFound { command: String },

    /// Neither the runner binary nor the Go toolchain is on PATH
    #[error("{toolchain} command not found - required for custom magefile.go commands")]
    ToolchainNotFound { toolchain: String },

    /// Target exited non-zero and wrote diagnostics to stderr
    #[error("custom command failed '{command}':\n{stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Target exited non-zero without any stderr output
    #[error("custom command failed '{command}': {status}")]
    CommandExited {
        command: String,
        exit_code: i32,
        status: ExitStatus,
    },

    /// Target did not finish before the deadline
    #[error("command timed out: '{command}' after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Failed to spawn the runner process
    #[error("failed to start custom command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not move magefile.go out of the way of magefiles/
    #[error("failed to temporarily rename {}: {source}", path.display())]
    SetAsideFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DelegateError {
    /// Exit code the CLI should surface for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DelegateError::CommandFailed { exit_code, .. }
            | DelegateError::CommandExited { exit_code, .. } => *exit_code,
            DelegateError::Timeout { .. } => crate::executor::TIMEOUT_EXIT_CODE,
            _ => 1,
        }
    }
}

/// Errors produced while scanning magefile sources
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A magefile source could not be read
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// A magefile source has a syntax error
    #[error("failed to parse {}:{line}:{column}: syntax error", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    /// The Go grammar could not be loaded into the parser
    #[error("failed to load Go grammar: {0}")]
    Grammar(String),
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
    pub stderr: Option<String>,
}

impl From<&DelegateError> for ErrorInfo {
    fn from(err: &DelegateError) -> Self {
        let (error_type, suggestion, stderr) = match err {
            DelegateError::CommandNotFound { .. } => (
                "command_not_found",
                Some("Run 'magefilehub init' to create a magefile.go".to_string()),
                None,
            ),
            DelegateError::ToolchainNotFound { toolchain } => (
                "toolchain_not_found",
                Some(format!("Install {} or mage and make sure it is on PATH", toolchain)),
                None,
            ),
            DelegateError::CommandFailed { stderr, .. } => {
                ("command_failed", suggest_fix(stderr), Some(stderr.clone()))
            }
            DelegateError::CommandExited { .. } => ("command_failed", None, None),
            DelegateError::Timeout { .. } => (
                "timeout",
                Some("Try increasing the timeout or checking if the target hangs".to_string()),
                None,
            ),
            DelegateError::SpawnFailed { .. } => ("spawn_failed", None, None),
            DelegateError::SetAsideFailed { .. } => (
                "set_aside_failed",
                Some("Remove either magefile.go or the magefiles/ directory".to_string()),
                None,
            ),
            DelegateError::Io(_) => ("io_error", None, None),
        };

        ErrorInfo {
            message: err.to_string(),
            error_type: error_type.to_string(),
            suggestion,
            exit_code: Some(err.exit_code()),
            stderr,
        }
    }
}

impl From<&DiscoveryError> for ErrorInfo {
    fn from(err: &DiscoveryError) -> Self {
        let error_type = match err {
            DiscoveryError::Read { .. } => "read_error",
            DiscoveryError::Parse { .. } => "parse_error",
            DiscoveryError::Grammar(_) => "grammar_error",
        };
        ErrorInfo {
            message: err.to_string(),
            error_type: error_type.to_string(),
            suggestion: match err {
                DiscoveryError::Parse { .. } => {
                    Some("Fix the syntax error, then run 'go vet' on the magefile".to_string())
                }
                _ => None,
            },
            exit_code: None,
            stderr: None,
        }
    }
}

/// Suggest fixes for common mage and go toolchain failures
pub fn suggest_fix(stderr: &str) -> Option<String> {
    if stderr.contains("Unknown target specified") {
        return Some(
            "Target not found in magefile. Run 'magefilehub list' to see available targets."
                .to_string(),
        );
    }

    if stderr.contains("go.mod file not found") || stderr.contains("cannot find main module") {
        return Some("No Go module found. Run 'go mod init' in the project root.".to_string());
    }

    if stderr.contains("build constraints exclude all Go files") {
        return Some("Add '//go:build mage' to the top of your magefile.".to_string());
    }

    if stderr.contains("no required module provides package") || stderr.contains("missing go.sum entry") {
        return Some("Missing dependencies. Run 'go mod tidy'.".to_string());
    }

    if stderr.contains("undefined:") || stderr.contains("syntax error") {
        return Some("The magefile does not compile. Run 'go vet' to see the details.".to_string());
    }

    if stderr.contains("Permission denied") {
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    None
}
