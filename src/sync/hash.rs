//! Content fingerprints for duplicate detection and copy skipping.
//!
//! Uses BLAKE3, switching to multicore hashing for large inputs.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Files above this size are read whole and hashed in parallel.
const PARALLEL_THRESHOLD: u64 = 1024 * 1024;

/// Digest of a file's full contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    hash: blake3::Hash,
    size: u64,
}

impl Fingerprint {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn to_hex(&self) -> String {
        self.hash.to_hex().to_string()
    }
}

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
    let hash = if data.len() as u64 > PARALLEL_THRESHOLD {
        let mut hasher = blake3::Hasher::new();
        hasher.update_rayon(data);
        hasher.finalize()
    } else {
        blake3::hash(data)
    };
    Fingerprint {
        hash,
        size: data.len() as u64,
    }
}

/// Fingerprint a file's full contents.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let size = file.metadata()?.len();

    if size > PARALLEL_THRESHOLD {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(fingerprint_bytes(&data));
    }

    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];
    let mut read_total = 0u64;
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        read_total += bytes_read as u64;
    }

    Ok(Fingerprint {
        hash: hasher.finalize(),
        size: read_total,
    })
}
