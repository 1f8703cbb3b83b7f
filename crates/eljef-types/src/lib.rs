//! # ElJef Types
//!
//! Error types and shared enums used by every ElJef crate.
//!
//! This crate provides:
//!
//! - The `EljefError` taxonomy and `Result` alias
//! - Data formats, hash algorithms and log levels
//! - Logging and settings configuration types
//!
//! ## Example
//!
//! ```
//! use eljef_types::{Format, HashAlgorithm};
//!
//! let format = Format::from_path("defaults.yaml").unwrap();
//! assert_eq!(format, Format::Yaml);
//!
//! let algorithm: HashAlgorithm = "sha256".parse().unwrap();
//! assert_eq!(algorithm, HashAlgorithm::Sha256);
//! assert!("crc-9000".parse::<HashAlgorithm>().is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod enums;
pub mod config;

// Re-export common types for convenience
pub use errors::{EljefError, Result};
pub use enums::{Format, HashAlgorithm, LogLevel};
pub use config::{LogConfig, LogFormat, SettingsScope};
