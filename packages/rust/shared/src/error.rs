//! Error types for frc-docs.
//!
//! Library crates use [`FrcDocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::Library;

/// Top-level error type for all frc-docs operations.
#[derive(Debug, thiserror::Error)]
pub enum FrcDocsError {
    /// Configuration loading or validation error (including a missing credential).
    #[error("config error: {message}")]
    Config { message: String },

    /// No usable URL source for a library.
    #[error("discovery error for {library}: {message}")]
    Discovery { library: String, message: String },

    /// Network/HTTP error during fetch.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed input (search index wrapper, sitemap XML, JSON payloads).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Generative text service error (HTTP, API, or response shape).
    #[error("generation error: {0}")]
    Generation(String),

    /// The persisted bundle is missing or corrupt.
    #[error("persistence error at {path:?}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// MCP transport failure while serving.
    #[error("transport error: {0}")]
    Transport(String),

    /// Data validation error (invalid arguments, unknown library, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FrcDocsError>;

impl FrcDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a discovery error for a library.
    pub fn discovery(library: Library, msg: impl Into<String>) -> Self {
        Self::Discovery {
            library: library.to_string(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a persistence error for the bundle at `path`.
    pub fn persistence(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
