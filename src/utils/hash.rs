use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::warn;
use sha2::{Digest as _, Sha256};

use crate::constants::DIGEST_BUFFER_SIZE;
use crate::models::Digest;

/// Calculate the SHA-256 of a file, streaming it in fixed-size chunks.
///
/// Returns the underlying I/O error so callers can classify and report it.
pub fn calculate_sha256(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; DIGEST_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest a file, mapping any read fault to [`Digest::Unavailable`].
///
/// Never fails: a vanished, locked or unreadable file simply has no digest.
pub fn digest(path: &Path) -> Digest {
    match calculate_sha256(path) {
        Ok(hex) => Digest::Hex(hex),
        Err(e) => {
            warn!("Failed to hash {}: {}", path.display(), e);
            Digest::Unavailable
        }
    }
}
