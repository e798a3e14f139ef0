use buffer_export_core::ExportError;
use thiserror::Error;

/// Failures inside the AAC/MP4 backend.
///
/// Converted into the matching `ExportError` class at the trait boundary.
#[derive(Debug, Error)]
pub enum AacError {
    #[error("unsupported sample rate for AAC: {0} Hz")]
    UnsupportedSampleRate(f64),

    #[error("unsupported channel count for AAC: {0}")]
    UnsupportedChannels(u16),

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("mp4 error: {0}")]
    Mp4(#[from] mp4::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no audio track found")]
    NoAudioTrack,
}

impl AacError {
    pub(crate) fn into_create_error(self) -> ExportError {
        ExportError::ContainerCreate(self.to_string())
    }

    pub(crate) fn into_write_error(self) -> ExportError {
        // Block index is filled in by the block writer.
        ExportError::Write {
            block: 0,
            reason: self.to_string(),
        }
    }
}
