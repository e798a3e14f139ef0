use std::path::Path;

use crate::models::error::ExportError;
use crate::models::format::StreamFormat;
use crate::models::request::FileType;

/// One block of interleaved client-format samples passed to the encoder.
///
/// `byte_size` is the declared payload size and must equal
/// `data.len() * 4` for 32-bit float samples.
#[derive(Debug, Clone, Copy)]
pub struct AudioBlock<'a> {
    pub channels: u16,
    pub data: &'a [f32],
    pub byte_size: u32,
}

/// The converter owned by an open encoder session.
pub trait AudioConverter {
    /// Set the target encode bit rate in bits per second.
    fn set_encode_bit_rate(&mut self, bits_per_second: u32) -> Result<(), ExportError>;

    /// Currently configured bit rate, `None` while at the encoder default.
    fn encode_bit_rate(&self) -> Option<u32>;
}

/// Stateful session bound to one output file.
///
/// Created by a `ContainerBackend`; `dispose` finalizes the file and releases
/// every OS resource the session holds. Implementations should also release
/// resources on drop in case `dispose` is never reached.
pub trait EncoderHandle {
    /// Declare the physical layout of the samples that will be written.
    fn set_client_format(&mut self, format: &StreamFormat) -> Result<(), ExportError>;

    /// The converter that turns client samples into file packets.
    fn converter(&mut self) -> Result<&mut dyn AudioConverter, ExportError>;

    /// Encode and write `frames` frames from `block`.
    fn write(&mut self, frames: u32, block: &AudioBlock<'_>) -> Result<(), ExportError>;

    /// Flush pending packets, finalize the container, close the file.
    fn dispose(self) -> Result<(), ExportError>
    where
        Self: Sized;
}

/// Factory for encoder sessions of one container family.
///
/// Implemented by:
/// - `AacFileBackend` (buffer-export-aac)
pub trait ContainerBackend: Send + Sync {
    type Handle: EncoderHandle;

    /// Create (or truncate, when `overwrite`) the file at `path`.
    ///
    /// Fails with `ContainerCreate` when the path is unwritable or the
    /// container cannot hold `format`.
    fn create(
        &self,
        path: &Path,
        file_type: FileType,
        format: &StreamFormat,
        overwrite: bool,
    ) -> Result<Self::Handle, ExportError>;
}
