//! Error types for Transdoc.
//!
//! Library crates use [`TransdocError`] via `thiserror`.
//! The server binary wraps this with `color-eyre` for startup diagnostics
//! and maps it to HTTP responses per request.

use std::path::PathBuf;

/// Top-level error type for all Transdoc operations.
#[derive(Debug, thiserror::Error)]
pub enum TransdocError {
    /// Inbound request is missing a field or carries an empty one.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The text generator returned nothing to parse.
    #[error("model response is empty")]
    EmptyResponse,

    /// The model response could not be turned into content blocks.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Upstream text generation failed (transport, quota, malformed payload).
    #[error("generation error: {0}")]
    Generation(String),

    /// The remote document could not be created.
    #[error("document create error: {0}")]
    DocumentCreate(String),

    /// A mutation batch was rejected. Chunks before the failing one stay applied.
    #[error("document mutate error after {applied}/{total} batches: {message}")]
    DocumentMutate {
        message: String,
        applied: usize,
        total: usize,
    },

    /// The document exists but could not be shared.
    #[error("document share error: {0}")]
    DocumentShare(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside the document and generation calls.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TransdocError>;

impl TransdocError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a mutate error for a failed batch.
    pub fn mutate(msg: impl Into<String>, applied: usize, total: usize) -> Self {
        Self::DocumentMutate {
            message: msg.into(),
            applied,
            total,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::EmptyResponse => "empty_response",
            Self::Parse { .. } => "parse",
            Self::Generation(_) => "generation",
            Self::DocumentCreate(_) => "document_create",
            Self::DocumentMutate { .. } => "document_mutate",
            Self::DocumentShare(_) => "document_share",
            Self::Config { .. } => "config",
            Self::Network(_) => "network",
            Self::Io { .. } => "io",
        }
    }
}
