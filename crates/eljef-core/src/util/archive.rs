//! Tar archive helpers.
//!
//! Archives may be plain tar or gzip-compressed tar; compression is detected
//! from the file header.

use eljef_types::{EljefError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tar::Archive;

use super::fs::require_file;
use super::strings::makestr;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn open(path: &Path) -> Result<Archive<Box<dyn Read>>> {
    require_file(path)?;

    let mut reader = BufReader::new(File::open(path)?);
    let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };

    Ok(Archive::new(reader))
}

fn archive_err(path: &Path, e: impl std::fmt::Display) -> EljefError {
    EljefError::Archive(format!("{}: {}", path.display(), e))
}

/// Member name as stored, without a trailing `/` on directories.
fn member_name(entry: &tar::Entry<'_, Box<dyn Read>>) -> Result<String> {
    let path = entry.path()?;
    Ok(path.to_string_lossy().trim_end_matches('/').to_string())
}

/// Unpack `file` into the existing directory `path`.
///
/// # Errors
///
/// `NotADirectory` when `path` is not a directory, `Archive` when `file` is
/// not a tar archive.
pub fn extract(file: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<()> {
    let (file, path) = (file.as_ref(), path.as_ref());
    let mut archive = open(file)?;
    if !path.is_dir() {
        return Err(EljefError::NotADirectory(path.to_path_buf()));
    }

    tracing::debug!("Extracting contents of {} to {}", file.display(), path.display());
    archive.unpack(path).map_err(|e| archive_err(file, e))
}

/// Names of all members in the archive at `path`, in archive order.
///
/// With `ignore_dots`, members whose base name starts with `.` are left out.
pub fn extract_file_list(path: impl AsRef<Path>, ignore_dots: bool) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut archive = open(path)?;

    tracing::debug!("Extracting file list from archive: {}", path.display());
    let mut names = Vec::new();
    for entry in archive.entries().map_err(|e| archive_err(path, e))? {
        let entry = entry.map_err(|e| archive_err(path, e))?;
        let name = member_name(&entry)?;
        let hidden = name.rsplit('/').next().is_some_and(|base| base.starts_with('.'));
        if !(ignore_dots && hidden) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Contents of the regular file `file_name` inside the archive at `path`.
///
/// Returns `None` when there is no such member or it is not a regular file.
pub fn file_extract(path: impl AsRef<Path>, file_name: &str) -> Result<Option<String>> {
    let path = path.as_ref();
    let mut archive = open(path)?;
    let wanted = file_name.trim_end_matches('/');

    tracing::debug!("Extracting file '{}' from archive '{}'", file_name, path.display());
    for entry in archive.entries().map_err(|e| archive_err(path, e))? {
        let mut entry = entry.map_err(|e| archive_err(path, e))?;
        if member_name(&entry)? != wanted {
            continue;
        }
        if !entry.header().entry_type().is_file() {
            return Ok(None);
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(|e| archive_err(path, e))?;
        return Ok(Some(makestr(buf)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tar::{Builder, EntryType, Header};
    use tempfile::TempDir;

    fn append<W: Write>(builder: &mut Builder<W>, name: &str, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    fn append_dir<W: Write>(builder: &mut Builder<W>, name: &str) {
        let mut header = Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(EntryType::Directory);
        header.set_cksum();
        builder.append_data(&mut header, name, std::io::empty()).unwrap();
    }

    fn fill<W: Write>(builder: &mut Builder<W>) {
        append_dir(builder, "conf/");
        append(builder, "conf/app.yaml", b"name: app\n");
        append(builder, "conf/.hidden", b"secret");
        append(builder, "README", b"readme");
    }

    fn gz_archive(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("test.tar.gz");
        let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        let mut builder = Builder::new(encoder);
        fill(&mut builder);
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    fn plain_archive(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("test.tar");
        let mut builder = Builder::new(File::create(&path).unwrap());
        fill(&mut builder);
        builder.finish().unwrap();
        path
    }

    #[test]
    fn test_extract() {
        let dir = TempDir::new().unwrap();
        let archive = gz_archive(&dir);
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();

        extract(&archive, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("conf/app.yaml")).unwrap(), "name: app\n");
        assert_eq!(std::fs::read_to_string(dest.join("README")).unwrap(), "readme");
    }

    #[test]
    fn test_extract_needs_directory() {
        let dir = TempDir::new().unwrap();
        let archive = gz_archive(&dir);

        let missing = dir.path().join("missing");
        assert!(matches!(extract(&archive, &missing), Err(EljefError::NotADirectory(_))));
        assert!(matches!(extract(&archive, &archive), Err(EljefError::NotADirectory(_))));
    }

    #[test]
    fn test_extract_not_an_archive() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "not an archive\n".repeat(100)).unwrap();

        assert!(matches!(extract(&file, dir.path()), Err(EljefError::Archive(_))));
        assert!(matches!(extract_file_list(&file, false), Err(EljefError::Archive(_))));
        assert!(matches!(
            extract_file_list(dir.path().join("nope.tar"), false),
            Err(EljefError::NotFound(_))
        ));
    }

    #[test]
    fn test_extract_file_list() {
        let dir = TempDir::new().unwrap();
        for archive in [gz_archive(&dir), plain_archive(&dir)] {
            assert_eq!(
                extract_file_list(&archive, false).unwrap(),
                vec!["conf", "conf/app.yaml", "conf/.hidden", "README"]
            );
            assert_eq!(
                extract_file_list(&archive, true).unwrap(),
                vec!["conf", "conf/app.yaml", "README"]
            );
        }
    }

    #[test]
    fn test_file_extract() {
        let dir = TempDir::new().unwrap();
        let archive = gz_archive(&dir);

        assert_eq!(file_extract(&archive, "conf/app.yaml").unwrap().as_deref(), Some("name: app\n"));
        assert_eq!(file_extract(&archive, "missing.txt").unwrap(), None);
        assert_eq!(file_extract(&archive, "conf").unwrap(), None);
    }
}
