use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Streams `reader` through SHA-256 and returns the lowercase hex digest.
pub fn sha256_hex_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buffer)
            .context("failed reading payload for sha256")?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Returns the actual digest on mismatch, `None` when the file matches.
pub fn verify_sha256_file(path: &Path, expected_hex: &str) -> Result<Option<String>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {} for sha256", path.display()))?;
    let actual = sha256_hex_reader(BufReader::new(file))
        .with_context(|| format!("failed to hash {}", path.display()))?;
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(None)
    } else {
        Ok(Some(actual))
    }
}
