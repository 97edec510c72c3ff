use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::types::types::DownloadError;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Installs downloaded packages and validates cached ones.
pub trait Installer: Send + Sync {
    fn install_apk(&self, file: &Path, authority: &str) -> Result<(), DownloadError>;

    /// Whether the package at `file` carries `version_code` for this app.
    fn apk_version_matches(&self, version_code: i64, file: &Path) -> Result<bool, DownloadError>;

    /// Unreadable files never match.
    fn check_file_checksum(&self, file: &Path, expected: &str) -> bool {
        match file_checksum(file, expected.trim().len()) {
            Ok(actual) => actual.eq_ignore_ascii_case(expected.trim()),
            Err(e) => {
                log::warn!("[Installer] checksum of {} failed: {}", file.display(), e);
                false
            }
        }
    }
}

/// Hex digest of `file`: SHA-256 when the expected value is 64 hex
/// characters long, MD5 otherwise.
pub fn file_checksum(file: &Path, expected_len: usize) -> Result<String, DownloadError> {
    if expected_len == 64 {
        digest_file::<Sha256>(file)
    } else {
        digest_file::<Md5>(file)
    }
}

fn digest_file<D: Digest>(path: &Path) -> Result<String, DownloadError> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}
