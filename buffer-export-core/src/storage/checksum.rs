use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::ExportError;

/// Compute the SHA-256 hex digest of a file, streaming it in 64 KiB reads.
pub fn sha256_file(path: &Path) -> Result<String, ExportError> {
    let file = File::open(path)
        .map_err(|e| ExportError::Storage(format!("failed to open file for checksum: {}", e)))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| ExportError::Storage(format!("failed to read file for checksum: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn checksum_of_known_content() {
        let path = std::env::temp_dir().join("buffer_export_test_checksum.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_storage_error() {
        assert!(matches!(
            sha256_file(Path::new("/nonexistent/file.m4a")),
            Err(ExportError::Storage(_))
        ));
    }
}
