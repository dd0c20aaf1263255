//! Error types for toolshed-core

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for toolshed operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No install method produced a verified executable
    #[error("Tool '{tool}' is unavailable: no install method succeeded ({})", .attempts.join("; "))]
    #[diagnostic(
        code(toolshed::tool::unavailable),
        help("Check that conda is on PATH, network access is available, or a bundled binary exists")
    )]
    ToolUnavailable {
        /// Name of the tool that could not be resolved
        tool: String,
        /// One entry per attempted method, with the reason it failed
        attempts: Vec<String>,
    },

    /// A child process exited unsuccessfully
    #[error("Command failed with {}: {command}", status_text(.code))]
    #[diagnostic(code(toolshed::process::failed))]
    ProcessFailure {
        /// Rendered, shell-quoted command line
        command: String,
        /// Exit code, or `None` when terminated by a signal
        code: Option<i32>,
    },

    /// A child process could not be started
    #[error("Failed to start {command}: {source}")]
    #[diagnostic(code(toolshed::process::spawn))]
    Spawn {
        /// Rendered, shell-quoted command line
        command: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A working-tree path does not lead into the object store
    #[error("Broken store reference {}: {reason}", .path.display())]
    #[diagnostic(code(toolshed::annex::broken_reference))]
    BrokenReference {
        /// The caller-visible path
        path: PathBuf,
        /// What went wrong while following it
        reason: String,
    },

    /// A tool ran successfully but printed something unusable
    #[error("Unexpected output from {command}: {message}")]
    #[diagnostic(code(toolshed::process::output))]
    UnexpectedOutput {
        /// Rendered, shell-quoted command line
        command: String,
        /// What was wrong with the output
        message: String,
    },

    /// A single install method failed
    #[error("Install method {method} failed: {message}")]
    #[diagnostic(code(toolshed::tool::install_method))]
    InstallMethodFailure {
        /// Description of the method
        method: String,
        /// The failure reason
        message: String,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(toolshed::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path involved, if any
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(toolshed::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
    },

    /// HTTP download error
    #[error("Download of {url} failed: {message}")]
    #[diagnostic(code(toolshed::download::failed))]
    Download {
        /// The URL being fetched
        url: String,
        /// The failure reason
        message: String,
    },

    /// Archive unpacking error
    #[error("Failed to unpack {archive}: {message}")]
    #[diagnostic(code(toolshed::download::archive))]
    Archive {
        /// Name of the archive
        archive: String,
        /// The failure reason
        message: String,
    },

    /// Downloaded content did not match its expected digest
    #[error("Digest mismatch for {url}: expected {expected}, got {actual}")]
    #[diagnostic(code(toolshed::download::digest_mismatch))]
    DigestMismatch {
        /// The URL that was fetched
        url: String,
        /// The expected sha256
        expected: String,
        /// The computed sha256
        actual: String,
    },
}

fn status_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_string(),
    }
}

impl Error {
    /// Create a tool unavailable error
    pub fn tool_unavailable(tool: impl Into<String>, attempts: Vec<String>) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            attempts,
        }
    }

    /// Create a process failure error
    pub fn process_failure(command: impl Into<String>, code: Option<i32>) -> Self {
        Self::ProcessFailure {
            command: command.into(),
            code,
        }
    }

    /// Create an unexpected output error
    pub fn unexpected_output(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a broken reference error
    pub fn broken_reference(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::BrokenReference {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an install method failure
    pub fn install_method(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InstallMethodFailure {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<&Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(Into::into),
            operation: operation.into(),
        }
    }

    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a download error
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an archive error
    pub fn archive(archive: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Archive {
            archive: archive.into(),
            message: message.into(),
        }
    }
}

/// Result type for toolshed operations
pub type Result<T> = std::result::Result<T, Error>;
