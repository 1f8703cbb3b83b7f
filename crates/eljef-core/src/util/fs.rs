//! Filesystem utilities.
//!
//! Thin wrappers over `std::fs` that log what they touch and report missing
//! paths as `EljefError::NotFound` instead of a bare I/O error.

use eljef_types::{EljefError, Format, Result};
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::data::{self, DumpOptions};

/// Whether `path` exists. Broken symlinks count as existing.
pub fn exists(path: impl AsRef<Path>) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Expand path with tilde.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Fail with `NotFound` or `NotAFile` unless `path` is a regular file.
pub(crate) fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(EljefError::NotFound(format!(
            "Specified file does not exist: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(EljefError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

/// Read a file as text, replacing invalid UTF-8. With `strip`, leading and
/// trailing whitespace is removed.
pub fn file_read(path: impl AsRef<Path>, strip: bool) -> Result<String> {
    let path = path.as_ref();
    require_file(path)?;

    tracing::debug!("Read file: {}", path.display());
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(if strip { text.trim().to_string() } else { text.into_owned() })
}

/// Read a file and parse it as `format`.
///
/// When `default` is set, a missing file yields an empty mapping instead of
/// `NotFound`.
pub fn file_read_convert(path: impl AsRef<Path>, format: Format, default: bool) -> Result<Value> {
    let path = path.as_ref();
    if default && !path.exists() {
        tracing::debug!("{} does not exist, using empty {} data", path.display(), format);
        return Ok(data::empty_mapping());
    }

    let content = file_read(path, false)?;
    data::loads(&content, format)
}

/// Write `data` to a file, creating or truncating it. With `backup`, an
/// existing file is moved aside first.
pub fn file_write(path: impl AsRef<Path>, data: impl AsRef<[u8]>, backup: bool) -> Result<()> {
    let path = path.as_ref();
    if backup && exists(path) {
        backup_path(path)?;
    }

    tracing::debug!("Write to file: {}", path.display());
    let data = data.as_ref();
    fs::write(path, data)?;
    tracing::debug!("Wrote {} bytes", data.len());

    Ok(())
}

/// Serialize `value` as `format` and write it to `path`.
pub fn file_write_convert(
    path: impl AsRef<Path>,
    format: Format,
    value: &Value,
    options: &DumpOptions,
    backup: bool,
) -> Result<()> {
    let content = data::dumps(value, format, options)?;
    file_write(path, content, backup)
}

/// Move `path` to the first free backup name: `path.bak`, then
/// `path.bak.1`, `path.bak.2`, ...
///
/// Returns the backup path.
pub fn backup_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !exists(path) {
        return Err(EljefError::NotFound(format!(
            "Cannot back up missing path: {}",
            path.display()
        )));
    }

    let with_suffix = |suffix: String| {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };

    let mut candidate = with_suffix(".bak".to_string());
    let mut count = 1;
    while exists(&candidate) {
        candidate = with_suffix(format!(".bak.{}", count));
        count += 1;
    }

    tracing::debug!("Backing up {} to {}", path.display(), candidate.display());
    fs::rename(path, &candidate)?;

    Ok(candidate)
}

/// Delete a file, directory tree or link.
///
/// A path that does not exist is not an error. With `follow`, the target of
/// a symlink is deleted as well. With `backup`, the path is moved aside
/// instead of deleted and links are not followed.
pub fn delete(path: impl AsRef<Path>, follow: bool, backup: bool) -> Result<()> {
    let path = path.as_ref();
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if backup {
        backup_path(path)?;
        return Ok(());
    }

    let result = if meta.file_type().is_symlink() {
        let target = if follow { fs::canonicalize(path).ok() } else { None };
        tracing::debug!("Deleting link {}", path.display());
        fs::remove_file(path)?;
        if let Some(target) = target {
            tracing::debug!("Deleting link target {}", target.display());
            delete(&target, false, false)?;
        }
        Ok(())
    } else if meta.is_dir() {
        tracing::debug!("Deleting directory {}", path.display());
        fs::remove_dir_all(path)
    } else {
        tracing::debug!("Deleting file {}", path.display());
        fs::remove_file(path)
    };

    match result {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Create a directory and any missing parents.
///
/// An existing directory is left alone unless `del_exist` is set, in which
/// case it is deleted and recreated.
pub fn mkdir(path: impl AsRef<Path>, del_exist: bool) -> Result<()> {
    let path = path.as_ref();

    if exists(path) {
        if del_exist {
            delete(path, false, false)?;
        } else if !path.is_dir() {
            return Err(EljefError::NotADirectory(path.to_path_buf()));
        } else {
            return Ok(());
        }
    }

    tracing::debug!("Creating directory {}", path.display());
    fs::create_dir_all(path)?;
    Ok(())
}

/// Scoped working directory change, like `pushd`/`popd`.
///
/// The previous working directory is restored when the guard is dropped.
/// The working directory is process-wide state.
///
/// ```no_run
/// use eljef_core::util::fs::Pushd;
///
/// {
///     let _dir = Pushd::new("/tmp")?;
///     // relative paths now resolve under /tmp
/// }
/// # Ok::<(), eljef_core::EljefError>(())
/// ```
#[derive(Debug)]
pub struct Pushd {
    previous: PathBuf,
    current: PathBuf,
}

impl Pushd {
    /// Change into `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(EljefError::NotFound(format!(
                "Provided path does not exist: {}",
                path.display()
            )));
        }

        let previous = env::current_dir()?;
        env::set_current_dir(path)?;
        tracing::debug!("pushd {}", path.display());

        Ok(Self {
            previous,
            current: path.to_path_buf(),
        })
    }

    /// Directory that was changed into.
    pub fn path(&self) -> &Path {
        &self.current
    }
}

impl Drop for Pushd {
    fn drop(&mut self) {
        match env::set_current_dir(&self.previous) {
            Ok(()) => tracing::debug!("popd {}", self.current.display()),
            Err(e) => tracing::warn!("popd to {} failed: {}", self.previous.display(), e),
        }
    }
}
