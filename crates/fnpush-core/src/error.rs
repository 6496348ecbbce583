//! Error types for fnpush

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for fnpush operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fnpush
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String, help: String },

    /// Compile stage error (toolchain failed to start, no output produced)
    #[error("Compile error: {message}")]
    Compile { message: String, help: String },

    /// Compiler returned a failure status; its combined output is carried
    /// verbatim since it is the only detailed diagnostic channel
    #[error("Compile error: go build exited with {status}\n{output}")]
    CompilerFailed { status: String, output: String },

    /// Packaging error
    #[error("Packaging error: {message}")]
    Archive { message: String, help: String },

    /// Upload error
    #[error("Upload error: {message}")]
    Upload { message: String, help: String },

    /// Function update error
    #[error("Function update error: {message}")]
    Update { message: String, help: String },

    /// Cleanup error
    #[error("Cleanup error: {message}")]
    Cleanup { message: String, help: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a compile stage error
    pub fn compile(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a compiler failure carrying the compiler's combined output
    pub fn compiler_failed(status: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CompilerFailed {
            status: status.into(),
            output: output.into(),
        }
    }

    /// Create a packaging error
    pub fn archive(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an upload error
    pub fn upload(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a function update error
    pub fn update(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Update {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a cleanup error
    pub fn cleanup(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Cleanup {
            message: message.into(),
            help: help.into(),
        }
    }
}
