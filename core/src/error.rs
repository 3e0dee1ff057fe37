//! # Error Handling
//!
//! Provides the unified `PatchError` enum used across the workspace.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// Only `std::io::Error` converts implicitly; every other variant is built
/// explicitly so the failing file or operation is always named.
#[derive(Debug, Display, From)]
pub enum PatchError {
    /// The input document (or plan) does not exist.
    #[from(ignore)]
    #[display("File not found: {}", _0.display())]
    NotFound(PathBuf),

    /// Content is not valid JSON/YAML, or does not have the expected shape.
    #[from(ignore)]
    #[display("Parse Error in {origin}: {message}")]
    Parse {
        /// File or source being parsed.
        origin: String,
        /// Underlying parser message.
        message: String,
    },

    /// An operation targets a field whose parent container does not exist.
    #[from(ignore)]
    #[display("Path Error in `{operation}`: segment '{segment}' of '{path}' does not exist")]
    Path {
        /// Description of the failing operation.
        operation: String,
        /// The full dotted path being resolved.
        path: String,
        /// The first segment that could not be resolved.
        segment: String,
    },

    /// Wrapper for standard IO errors (write failure, backup collision).
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document is not in the state an operation requires.
    #[from(ignore)]
    #[display("Precondition failed: {_0}")]
    Precondition(String),

    /// A server URL matcher is not a valid regular expression.
    #[from(ignore)]
    #[display("Invalid pattern in `{operation}`: {message}")]
    Pattern {
        /// Description of the failing operation.
        operation: String,
        /// The expression and the compiler's message.
        message: String,
    },
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for PatchError {}

impl PatchError {
    /// Builds a `Path` error.
    pub fn path(
        operation: impl Into<String>,
        path: impl Into<String>,
        segment: impl Into<String>,
    ) -> Self {
        PatchError::Path {
            operation: operation.into(),
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Builds a `Parse` error.
    pub fn parse(origin: impl Into<String>, message: impl ToString) -> Self {
        PatchError::Parse {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Prefixes the origin of a `Parse` error with the failing operation.
    /// Other variants are returned unchanged.
    pub(crate) fn in_operation(self, operation: &str) -> Self {
        match self {
            PatchError::Parse { origin, message } => PatchError::Parse {
                origin: format!("`{}` {}", operation, origin),
                message,
            },
            other => other,
        }
    }
}

/// Helper type alias for Result using PatchError.
pub type PatchResult<T> = Result<T, PatchError>;
