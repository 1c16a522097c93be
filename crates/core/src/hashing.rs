//! SHA-256 hex digest utilities shared by the proof builder and the
//! download handler.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::CoreError;

/// Read size for streaming file digests.
const CHUNK_SIZE: usize = 8192;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compute a SHA-256 hex digest of a file, streaming it in 8 KiB chunks.
pub async fn sha256_file(path: &Path) -> Result<String, CoreError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to open {}: {e}", path.display())))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read {}: {e}", path.display())))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}
