use thiserror::Error;

/// Errors that can occur while exporting a sample buffer.
///
/// Every variant except `BitRateRejected` is fatal to the export that
/// produced it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("invalid source buffer: {0}")]
    InvalidSource(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("container create failed: {0}")]
    ContainerCreate(String),

    #[error("client format rejected: {0}")]
    ClientFormat(String),

    /// Non-fatal: the export continues at the encoder's default rate.
    #[error("bit rate {requested} bps rejected: {reason}")]
    BitRateRejected { requested: u32, reason: String },

    #[error("write failed at block {block}: {reason}")]
    Write { block: usize, reason: String },

    #[error("export cancelled after {frames_written} frames")]
    Cancelled { frames_written: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl ExportError {
    /// Whether this error aborts the export.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::BitRateRejected { .. })
    }
}
