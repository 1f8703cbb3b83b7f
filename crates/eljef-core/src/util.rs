//! Common utility functions.

pub mod archive;
pub mod data;
pub mod fs;
pub mod hash;
pub mod kv;
pub mod strings;
pub mod xml;

// Re-export commonly used items
pub use data::{deep_merge, merge, merge_layers, get_path, DumpOptions};
pub use fs::{file_read, file_read_convert, file_write, file_write_convert, mkdir, Pushd};
pub use hash::{digest, digest_bytes, digest_file, DigestInput};
