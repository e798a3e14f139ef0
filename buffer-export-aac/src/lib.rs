//! # buffer-export-aac
//!
//! AAC-LC / MPEG-4 audio (`.m4a`) backend for buffer-export.
//!
//! Provides:
//! - `AacFileBackend`: `ContainerBackend` creating `.m4a` files
//! - `AacFileHandle`: encoder session, float → 16-bit PCM → AAC packets → MP4 track
//! - `probe`: reads channel count and sample rate back from a finished file
//!
//! Supports the MPEG-4 channel configurations (1 to 6 channels, and 8 for
//! 7.1) at the MPEG-4 sampling frequencies from 8 kHz to 96 kHz. Multichannel
//! input is expected in WAV order (L R C LFE Ls Rs for 5.1). Encoding uses the
//! Fraunhofer FDK AAC library, muxing the `mp4` crate.
//!
//! ## Usage
//! ```ignore
//! use buffer_export_aac::AacFileBackend;
//! use buffer_export_core::{ExportOptions, ExportRequest, Exporter, SampleBuffer};
//!
//! let buffer = SampleBuffer::new(&samples, 2, 48000.0)?;
//! let exporter = Exporter::new(AacFileBackend::new());
//! let options = ExportOptions { bit_rate_kbps: 128, ..Default::default() };
//! exporter.export(&ExportRequest::new("take.m4a", &buffer, options))?;
//! ```

pub mod backend;
pub mod converter;
pub mod encoder;
pub mod error;
pub mod handle;
pub mod pcm;
pub mod probe;

pub use backend::AacFileBackend;
pub use converter::AacConverter;
pub use encoder::AacEncoder;
pub use error::AacError;
pub use handle::AacFileHandle;
pub use probe::{probe, ContainerInfo};
