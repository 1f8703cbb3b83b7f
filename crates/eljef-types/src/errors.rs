//! Error types for ElJef operations.

use crate::enums::Format;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ElJef operations.
///
/// Every helper in the library fails fast with one of these variants. None
/// of them carry partial results.
#[derive(Error, Debug)]
pub enum EljefError {
    /// A file, path or key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content is not valid for the format it was read as
    #[error("{format} parsing error: {message}")]
    Parse {
        /// Format the content was parsed as
        format: Format,
        /// Parser message
        message: String,
    },

    /// Unknown data format name or file extension
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Unknown hash algorithm name
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Path exists but is not a regular file
    #[error("Specified path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Path exists but is not a directory
    #[error("Path exists, but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// File is not a readable tar archive
    #[error("Archive error: {0}")]
    Archive(String),

    /// A value has the wrong shape for the requested operation
    #[error("Type error: {0}")]
    Type(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl EljefError {
    /// Build a parse error for `format` from any displayable parser error.
    pub fn parse(format: Format, message: impl fmt::Display) -> Self {
        EljefError::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Whether this error means the requested file, path or key is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            EljefError::NotFound(_) => true,
            EljefError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// A specialized Result type for ElJef operations.
pub type Result<T> = std::result::Result<T, EljefError>;

/// Helper macro to bail out with an EljefError
///
/// # Example
///
/// ```ignore
/// if !path.is_file() {
///     bail!(NotFound, "Specified file does not exist: {}", path.display());
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::EljefError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::EljefError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::EljefError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::EljefError::Other(format!($fmt, $($arg)*)))
    };
}
