//! # ElJef Core
//!
//! Shared helpers for the ElJef family of command-line tools.
//!
//! This crate provides:
//!
//! - **Settings**: layered configuration files merged into one value
//! - **Merging**: deep merge of mappings, with sequences replaced wholesale
//! - **File Operations**: YAML/XML/JSON/key-value reading and writing,
//!   backups, deletion, directory creation
//! - **Hashing**: streamed MD5/SHA digests as lowercase hex
//! - **DictObj**: mapping wrapper with explicit accessors and defaults
//! - **Logging**: console and file logging setup
//!
//! ## Example
//!
//! ```no_run
//! use eljef_core::{config, log, util};
//! use eljef_core::HashAlgorithm;
//!
//! // Initialize logging
//! log::setup_app_logging(false, None)?;
//!
//! // Load layered configuration
//! let settings = config::load(&["defaults.yaml", "site.yaml"])?;
//!
//! // Use utilities
//! let digest = util::digest_file("release.tar.gz", HashAlgorithm::Sha256)?;
//! # Ok::<(), eljef_core::EljefError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dictobj;
pub mod log;
pub mod util;

// Re-export commonly used items
pub use config::{load, Settings};
pub use dictobj::DictObj;
pub use eljef_types::{EljefError, Format, HashAlgorithm, Result, SettingsScope};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = "eljef";
