//! Recording backend used by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::ExportError;
use crate::models::format::StreamFormat;
use crate::models::request::FileType;
use crate::traits::container_backend::{AudioBlock, AudioConverter, ContainerBackend, EncoderHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(PathBuf),
    ClientFormat(StreamFormat),
    BitRate(u32),
    Write { frames: u32, byte_size: u32, first_sample: Option<f32> },
    Dispose,
}

#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub create: bool,
    pub client_format: bool,
    pub bit_rate: bool,
    /// Zero-based write call index that fails.
    pub write_at: Option<usize>,
}

#[derive(Default, Clone)]
pub struct RecordingBackend {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub failures: Failures,
}

impl RecordingBackend {
    pub fn failing(failures: Failures) -> Self {
        Self {
            calls: Arc::default(),
            failures,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Write { frames, byte_size, .. } => Some((frames, byte_size)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matcher(call)).count()
    }
}

impl ContainerBackend for RecordingBackend {
    type Handle = RecordingHandle;

    fn create(
        &self,
        path: &Path,
        _file_type: FileType,
        _format: &StreamFormat,
        _overwrite: bool,
    ) -> Result<Self::Handle, ExportError> {
        if self.failures.create {
            return Err(ExportError::ContainerCreate(format!("cannot create {}", path.display())));
        }
        self.calls.lock().push(Call::Create(path.to_path_buf()));
        Ok(RecordingHandle {
            calls: Arc::clone(&self.calls),
            failures: self.failures.clone(),
            converter: RecordingConverter {
                calls: Arc::clone(&self.calls),
                reject: self.failures.bit_rate,
                bit_rate: None,
            },
            writes: 0,
        })
    }
}

pub struct RecordingConverter {
    calls: Arc<Mutex<Vec<Call>>>,
    reject: bool,
    bit_rate: Option<u32>,
}

impl AudioConverter for RecordingConverter {
    fn set_encode_bit_rate(&mut self, bits_per_second: u32) -> Result<(), ExportError> {
        self.calls.lock().push(Call::BitRate(bits_per_second));
        if self.reject {
            return Err(ExportError::BitRateRejected {
                requested: bits_per_second,
                reason: "unsupported".into(),
            });
        }
        self.bit_rate = Some(bits_per_second);
        Ok(())
    }

    fn encode_bit_rate(&self) -> Option<u32> {
        self.bit_rate
    }
}

pub struct RecordingHandle {
    calls: Arc<Mutex<Vec<Call>>>,
    failures: Failures,
    converter: RecordingConverter,
    writes: usize,
}

impl EncoderHandle for RecordingHandle {
    fn set_client_format(&mut self, format: &StreamFormat) -> Result<(), ExportError> {
        self.calls.lock().push(Call::ClientFormat(*format));
        if self.failures.client_format {
            return Err(ExportError::ClientFormat("layout not supported".into()));
        }
        Ok(())
    }

    fn converter(&mut self) -> Result<&mut dyn AudioConverter, ExportError> {
        Ok(&mut self.converter)
    }

    fn write(&mut self, frames: u32, block: &AudioBlock<'_>) -> Result<(), ExportError> {
        self.calls.lock().push(Call::Write {
            frames,
            byte_size: block.byte_size,
            first_sample: block.data.first().copied(),
        });
        let index = self.writes;
        self.writes += 1;
        if self.failures.write_at == Some(index) {
            return Err(ExportError::Write {
                block: index,
                reason: "device full".into(),
            });
        }
        Ok(())
    }

    fn dispose(self) -> Result<(), ExportError> {
        self.calls.lock().push(Call::Dispose);
        Ok(())
    }
}
