//! Error types for the editing engine.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for editing operations.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tree-sitter parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Transform failed: {message}")]
    TransformFailed { message: String },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    AlreadyFinalized(String),

    #[error("Operation '{operation}' not supported for {kind}")]
    Unsupported { operation: String, kind: String },

    #[error("Nested transactions are not supported")]
    NestedTransaction,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Project mover failed: {0}")]
    Mover(String),

    #[error("{message}")]
    Raised {
        kind: ErrorKind,
        message: String,
        #[source]
        cause: Option<Arc<EditError>>,
    },
}

impl EditError {
    /// Shorthand for a [`EditError::TransformFailed`] error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::TransformFailed {
            message: message.into(),
        }
    }

    /// Classifies this error into the failure taxonomy carried by results.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Parse { .. } | Self::TransformFailed { .. } | Self::Query(_) => {
                ErrorKind::TransformFailed
            }
            Self::WriteFailed { .. } => ErrorKind::WriteFailed,
            Self::AlreadyFinalized(_) | Self::NestedTransaction => ErrorKind::AlreadyFinalized,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Io(_) => ErrorKind::Io,
            Self::Raised { kind, .. } => *kind,
            Self::Regex(_)
            | Self::Glob(_)
            | Self::Json(_)
            | Self::InvalidConfig(_)
            | Self::Mover(_) => ErrorKind::Other,
        }
    }
}

/// Failure categories reported by failed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed element does not resolve in the working set.
    NotFound,
    /// An add operation found the element already present.
    AlreadyExists,
    /// Parsing or mutating the source failed.
    TransformFailed,
    /// Writing a file failed.
    WriteFailed,
    /// The transaction was already committed or rolled back.
    AlreadyFinalized,
    /// The target kind does not support the operation.
    Unsupported,
    /// Reading from disk failed.
    Io,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::TransformFailed => "transform failed",
            Self::WriteFailed => "write failed",
            Self::AlreadyFinalized => "already finalized",
            Self::Unsupported => "unsupported",
            Self::Io => "io",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A specialized Result type for editing operations.
pub type Result<T> = std::result::Result<T, EditError>;
