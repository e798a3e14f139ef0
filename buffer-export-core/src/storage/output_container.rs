use std::path::{Path, PathBuf};

use crate::models::error::ExportError;
use crate::models::format::{self, StreamFormat};
use crate::models::request::FileType;
use crate::traits::container_backend::{AudioBlock, ContainerBackend, EncoderHandle};

/// Owns one encoder session from creation to disposal.
///
/// The handle is disposed exactly once: by `close`, or on drop when the
/// container goes out of scope on an error path.
pub struct OutputContainer<H: EncoderHandle> {
    handle: Option<H>,
    path: PathBuf,
    destination: StreamFormat,
    client_format: Option<StreamFormat>,
}

impl<H: EncoderHandle> OutputContainer<H> {
    /// Create the file at `path` with the destination format.
    ///
    /// No handle exists when this fails, so there is nothing to dispose.
    pub fn open<B>(
        backend: &B,
        path: &Path,
        file_type: FileType,
        destination: &StreamFormat,
        overwrite: bool,
    ) -> Result<Self, ExportError>
    where
        B: ContainerBackend<Handle = H>,
    {
        let handle = backend.create(path, file_type, destination, overwrite)?;
        log::debug!("Opened {} container at {}", file_type.extension(), path.display());
        Ok(Self {
            handle: Some(handle),
            path: path.to_path_buf(),
            destination: *destination,
            client_format: None,
        })
    }

    /// Tell the encoder the layout of the samples that will be written.
    pub fn negotiate_client_format(&mut self, source: &StreamFormat) -> Result<(), ExportError> {
        if !source.is_pcm() {
            return Err(ExportError::ClientFormat("client format must be linear PCM".into()));
        }
        format::ensure_compatible(source, &self.destination)?;
        self.handle_mut()?.set_client_format(source)?;
        self.client_format = Some(*source);
        Ok(())
    }

    /// Set the encoder's target bit rate.
    ///
    /// Any failure is reported as `BitRateRejected`; the session stays usable.
    pub fn set_bit_rate(&mut self, bits_per_second: u32) -> Result<(), ExportError> {
        let rejected = |reason: String| ExportError::BitRateRejected {
            requested: bits_per_second,
            reason,
        };
        let converter = self.handle_mut()?.converter().map_err(|e| rejected(e.to_string()))?;
        converter.set_encode_bit_rate(bits_per_second).map_err(|e| match e {
            ExportError::BitRateRejected { .. } => e,
            other => rejected(other.to_string()),
        })
    }

    /// Bit rate currently configured on the converter.
    pub fn bit_rate(&mut self) -> Option<u32> {
        self.handle
            .as_mut()
            .and_then(|handle| handle.converter().ok())
            .and_then(|converter| converter.encode_bit_rate())
    }

    /// Write one block. The client format must have been negotiated.
    pub fn write(&mut self, frames: u32, block: &AudioBlock<'_>) -> Result<(), ExportError> {
        if self.client_format.is_none() {
            return Err(ExportError::ClientFormat("client format not negotiated before write".into()));
        }
        self.handle_mut()?.write(frames, block)
    }

    pub fn client_format(&self) -> Option<&StreamFormat> {
        self.client_format.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalize the file and dispose the handle.
    pub fn close(mut self) -> Result<(), ExportError> {
        match self.handle.take() {
            Some(handle) => handle.dispose(),
            None => Ok(()),
        }
    }

    fn handle_mut(&mut self) -> Result<&mut H, ExportError> {
        self.handle
            .as_mut()
            .ok_or_else(|| ExportError::Storage("encoder handle already disposed".into()))
    }
}

impl<H: EncoderHandle> Drop for OutputContainer<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Disposing unclosed container at {}", self.path.display());
            if let Err(e) = handle.dispose() {
                log::error!("Failed to dispose encoder for {}: {}", self.path.display(), e);
            }
        }
    }
}
