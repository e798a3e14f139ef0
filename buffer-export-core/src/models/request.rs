use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ExportError;
use crate::traits::sample_source::SampleSource;

/// Frames pushed to the encoder per write call unless overridden.
pub const DEFAULT_BLOCK_FRAMES: usize = 8192;

/// Container/codec profile of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// AAC in an MPEG-4 audio container.
    M4a,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::M4a => "m4a",
        }
    }

    pub fn codec_name(&self) -> &'static str {
        match self {
            Self::M4a => "aac",
        }
    }
}

/// Per-export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Container/codec profile (default: m4a).
    pub file_type: FileType,

    /// Target bit rate in kbps; 0 keeps the encoder default.
    pub bit_rate_kbps: u32,

    /// Erase an existing file at the destination (default: true).
    /// When false, an existing file fails the export.
    pub overwrite: bool,

    /// Frames per encoder write (default: 8192).
    pub block_frames: usize,

    /// Write `{file}.metadata.json` next to the export (default: false).
    pub write_metadata: bool,
}

impl ExportOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.block_frames == 0 {
            return Err("block size must be at least one frame".into());
        }
        if self.bit_rate_kbps.checked_mul(1000).is_none() {
            return Err(format!("bit rate out of range: {} kbps", self.bit_rate_kbps));
        }
        Ok(())
    }

    /// Requested bit rate in bits per second, or `None` for the encoder default.
    pub fn bit_rate_bps(&self) -> Option<u32> {
        match self.bit_rate_kbps {
            0 => None,
            kbps => kbps.checked_mul(1000),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_type: FileType::M4a,
            bit_rate_kbps: 0,
            overwrite: true,
            block_frames: DEFAULT_BLOCK_FRAMES,
            write_metadata: false,
        }
    }
}

/// One export invocation: where to write, how, and what.
///
/// Built once per call and never modified afterwards.
pub struct ExportRequest<'a, S: SampleSource> {
    path: PathBuf,
    options: ExportOptions,
    source: &'a S,
}

impl<'a, S: SampleSource> ExportRequest<'a, S> {
    pub fn new(path: impl Into<PathBuf>, source: &'a S, options: ExportOptions) -> Self {
        Self {
            path: path.into(),
            options,
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.path.as_os_str().is_empty() {
            return Err(ExportError::Configuration("destination path is empty".into()));
        }
        self.options.validate().map_err(ExportError::Configuration)
    }
}
