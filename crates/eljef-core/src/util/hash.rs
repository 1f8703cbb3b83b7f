//! Hashing and encoding of files and in-memory data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use eljef_types::{HashAlgorithm, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::fs::require_file;

/// Read size used when streaming input through a hasher.
pub const BLOCK_SIZE: usize = 65536;

/// Data to digest: raw bytes or the contents of a file.
#[derive(Debug, Clone, Copy)]
pub enum DigestInput<'a> {
    /// In-memory bytes
    Bytes(&'a [u8]),
    /// Contents of the file at this path
    Path(&'a Path),
}

/// Digest `input` with the algorithm named `algorithm` (`"md5"`, `"sha1"`,
/// `"sha256"`, `"sha512"`).
///
/// # Errors
///
/// `UnsupportedAlgorithm` for unknown names, plus the errors of
/// [`digest_file`] for path input.
pub fn digest(input: DigestInput<'_>, algorithm: &str) -> Result<String> {
    let algorithm: HashAlgorithm = algorithm.parse()?;
    match input {
        DigestInput::Bytes(data) => Ok(digest_bytes(data, algorithm)),
        DigestInput::Path(path) => digest_file(path, algorithm),
    }
}

/// Lowercase hex digest of in-memory bytes.
pub fn digest_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}

/// Lowercase hex digest of everything `reader` yields, read in
/// [`BLOCK_SIZE`] chunks.
pub fn digest_reader<R: Read>(reader: &mut R, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => stream::<Md5, _>(reader),
        HashAlgorithm::Sha1 => stream::<Sha1, _>(reader),
        HashAlgorithm::Sha256 => stream::<Sha256, _>(reader),
        HashAlgorithm::Sha512 => stream::<Sha512, _>(reader),
    }
}

fn stream<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; BLOCK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex digest of a file's contents.
///
/// # Errors
///
/// `NotFound` when the file does not exist, `NotAFile` when the path is a
/// directory or other non-file.
pub fn digest_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<String> {
    let path = path.as_ref();
    require_file(path)?;

    tracing::debug!("Generating {} hash for {}", algorithm, path.display());
    let mut file = File::open(path)?;
    digest_reader(&mut file, algorithm)
}

/// MD5 hash of a file.
pub fn hash_md5(path: impl AsRef<Path>) -> Result<String> {
    digest_file(path, HashAlgorithm::Md5)
}

/// SHA-256 hash of a file.
pub fn hash_sha256(path: impl AsRef<Path>) -> Result<String> {
    digest_file(path, HashAlgorithm::Sha256)
}

/// SHA-512 hash of a file.
pub fn hash_sha512(path: impl AsRef<Path>) -> Result<String> {
    digest_file(path, HashAlgorithm::Sha512)
}

/// Base64 encoding of a file's contents.
pub fn encode_base64(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    require_file(path)?;

    tracing::debug!("Base64 encoding {}", path.display());
    let data = std::fs::read(path)?;
    Ok(STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eljef_types::EljefError;
    use tempfile::TempDir;

    const FIXTURE: &str = "some data\n    some more data\n    even more data\n    ";

    fn fixture(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("fixture");
        std::fs::write(&path, FIXTURE).unwrap();
        path
    }

    #[test]
    fn test_file_digests() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir);

        assert_eq!(hash_md5(&path).unwrap(), "6ab7331490715d56be198f0e0c6079cb");
        assert_eq!(
            hash_sha256(&path).unwrap(),
            "d94eb4cb7687832a9115cdfbea0bec0e0006dc2ec518531127d2426ac7d7c276"
        );
        assert_eq!(
            hash_sha512(&path).unwrap(),
            "d0dc6749ab8d63d5c1e3d19153150755beca1bec0b1ce14b6f8d1c36ceae4ed9\
             f0f398428187d7dbd17af7f72d27ad4fb83cc15270dec24c1a91444e9443402b"
        );
        assert_eq!(
            digest_file(&path, HashAlgorithm::Sha1).unwrap(),
            "d00e9aadbd128c27b29076d80fe5eaa764d563af"
        );
    }

    #[test]
    fn test_bytes_match_file() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir);

        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
            assert_eq!(
                digest_bytes(FIXTURE.as_bytes(), algorithm),
                digest_file(&path, algorithm).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(digest_bytes(b"", HashAlgorithm::Md5), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest_bytes(b"", HashAlgorithm::Sha1), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            digest(DigestInput::Bytes(b""), "sha256").unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_streaming_crosses_block_boundary() {
        let data = vec![7u8; BLOCK_SIZE * 2 + 17];
        let streamed = digest_reader(&mut data.as_slice(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(streamed, digest_bytes(&data, HashAlgorithm::Sha256));
        assert_eq!(streamed, digest_reader(&mut data.as_slice(), HashAlgorithm::Sha256).unwrap());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = digest(DigestInput::Bytes(b"abc"), "crc-9000").unwrap_err();
        assert!(matches!(err, EljefError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_missing_and_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("hopefully_this_file_does_not_exist");

        assert!(matches!(hash_md5(&missing), Err(EljefError::NotFound(_))));
        assert!(matches!(hash_sha256(dir.path()), Err(EljefError::NotAFile(_))));
        assert!(matches!(
            digest(DigestInput::Path(&missing), "sha512"),
            Err(EljefError::NotFound(_))
        ));
        assert!(matches!(encode_base64(dir.path()), Err(EljefError::NotAFile(_))));
    }

    #[test]
    fn test_encode_base64() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir);
        assert_eq!(
            encode_base64(&path).unwrap(),
            "c29tZSBkYXRhCiAgICBzb21lIG1vcmUgZGF0YQogICAgZXZlbiBtb3JlIGRhdGEKICAgIA=="
        );
    }
}
