use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::ExportError;
use crate::models::export_result::ExportMetadata;

/// Path of the JSON sidecar for an exported file: `{export}.metadata.json`.
pub fn metadata_path(export_path: &Path) -> PathBuf {
    export_path.with_extension("metadata.json")
}

/// Write export metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &ExportMetadata, export_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| ExportError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(export_path), json)
        .map_err(|e| ExportError::Storage(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read export metadata from a JSON sidecar file.
pub fn read_metadata(export_path: &Path) -> Result<ExportMetadata, ExportError> {
    let json = fs::read_to_string(metadata_path(export_path))
        .map_err(|e| ExportError::Storage(format!("failed to read metadata: {}", e)))?;
    let metadata: ExportMetadata = serde_json::from_str(&json)
        .map_err(|e| ExportError::Storage(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
