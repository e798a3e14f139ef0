use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::request::FileType;

/// Result returned when an export completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub file_path: PathBuf,
    pub frames_written: u64,
    pub blocks_written: usize,
    pub channels: u16,
    pub sample_rate: f64,
    pub duration_secs: f64,
    /// Bit rate the encoder was configured with; `None` when it kept its default.
    pub bit_rate_bps: Option<u32>,
    pub checksum: String,
    pub metadata: ExportMetadata,
}

/// Metadata describing an exported file.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub checksum: String,
    pub file_type: FileType,
    pub codec: String,
    pub channels: u16,
    pub sample_rate: f64,
    pub frames: u64,
    pub duration_secs: f64,
    pub requested_bit_rate_kbps: u32,
    pub applied_bit_rate_bps: Option<u32>,
}

impl ExportMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_path: &str,
        checksum: &str,
        file_type: FileType,
        channels: u16,
        sample_rate: f64,
        frames: u64,
        requested_bit_rate_kbps: u32,
        applied_bit_rate_bps: Option<u32>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            file_type,
            codec: file_type.codec_name().to_string(),
            channels,
            sample_rate,
            frames,
            duration_secs: frames as f64 / sample_rate,
            requested_bit_rate_kbps,
            applied_bit_rate_bps,
        }
    }
}
