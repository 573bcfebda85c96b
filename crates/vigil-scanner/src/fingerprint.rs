//! Content fingerprint computation.
//!
//! This module computes a SHA-256 digest over a file's full byte content.
//! The file is read in fixed-size chunks so memory use stays bounded no
//! matter how large the monitored file is.

use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use sha2::{Digest as _, Sha256};

use vigil_core::Digest;

use crate::error::ScanError;

/// Size of the read buffer used for incremental hashing.
const CHUNK_SIZE: usize = 64 * 1024;

/// Computes the SHA-256 content digest of a file.
///
/// Identical byte content always yields an identical digest, regardless of
/// path; a single-byte change yields a different digest with overwhelming
/// probability. The file is streamed, never loaded whole.
///
/// # Errors
///
/// Returns [`ScanError::Read`] if the file cannot be opened or read
/// (missing, permission denied, removed mid-read).
///
/// # Examples
///
/// ```ignore
/// use vigil_scanner::fingerprint;
/// use camino::Utf8Path;
///
/// let digest = fingerprint(Utf8Path::new("/watched/a.txt"))?;
/// println!("{digest}");
/// ```
pub fn fingerprint(path: &Utf8Path) -> Result<Digest, ScanError> {
    let mut file = File::open(path.as_std_path()).map_err(|e| ScanError::read(path, e))?;
    digest_reader(&mut file).map_err(|e| ScanError::read(path, e))
}

/// Streams a reader through SHA-256 in fixed-size chunks.
fn digest_reader<R: Read>(reader: &mut R) -> std::io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(Digest::from_bytes(hasher.finalize().into()))
}
