//! Typed error handling for curriscan.
//!
//! Only two things are real failures here: a file that cannot be read, and a
//! located class whose body does not parse. Everything else (missing classes,
//! unsupported `levels` expressions) is expressed as `None` in the results.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for curriscan operations.
#[derive(Error, Debug)]
pub enum CurriscanError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The located class is not a parseable block
    #[error("Malformed source in {}: {message}", describe(.path))]
    Malformed {
        path: Option<PathBuf>,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
    },

    /// The tree-sitter grammar could not be loaded
    #[error("Grammar error: {message}")]
    Grammar { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Cache-related errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Path traversal or security error
    #[error("Security error: {message}")]
    Security { message: String },
}

fn describe(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<source>".to_string())
}

impl CurriscanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a malformed-source error at a 1-indexed line.
    pub fn malformed_at(message: impl Into<String>, line: usize) -> Self {
        Self::Malformed {
            path: None,
            message: message.into(),
            line: Some(line),
        }
    }

    /// Create a malformed-source error without location.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            path: None,
            message: message.into(),
            line: None,
        }
    }

    /// Create a grammar error.
    pub fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a security error.
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security {
            message: message.into(),
        }
    }

    /// Attach a file path to a malformed-source error. Other variants already
    /// carry their path and are returned unchanged.
    pub fn in_file(self, file: &Path) -> Self {
        match self {
            Self::Malformed { message, line, .. } => Self::Malformed {
                path: Some(file.to_path_buf()),
                message,
                line,
            },
            other => other,
        }
    }
}

/// Convenience type alias for curriscan results.
pub type CurriscanResult<T> = Result<T, CurriscanError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> CurriscanResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> CurriscanResult<T> {
        self.map_err(|e| CurriscanError::io(path, e))
    }
}
