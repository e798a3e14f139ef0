//! # buffer-export-core
//!
//! Codec-agnostic core for exporting in-memory float audio buffers to
//! compressed files.
//!
//! Builds source/destination stream formats, opens an output container
//! through a `ContainerBackend`, streams the buffer in fixed-size blocks and
//! reports one outcome per export. Concrete codecs (AAC in `.m4a`) live in
//! backend crates that implement `ContainerBackend`.
//!
//! ## Architecture
//!
//! ```text
//! buffer-export-core (this crate)
//! ├── traits/       ← ContainerBackend, EncoderHandle, AudioConverter, SampleSource, ExportDelegate
//! ├── models/       ← ExportError, ExportState, StreamFormat, ExportRequest, ExportReport
//! ├── processing/   ← SampleBuffer, SharedSampleBuffer, BlockWriter
//! ├── session/      ← Exporter (orchestrator)
//! └── storage/      ← OutputContainer, checksum, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::error::ExportError;
pub use models::export_result::{ExportMetadata, ExportReport};
pub use models::format::{destination_format, source_format, AacObjectType, FormatFlags, FormatId, StreamFormat};
pub use models::request::{ExportOptions, ExportRequest, FileType, DEFAULT_BLOCK_FRAMES};
pub use models::state::ExportState;
pub use processing::block_writer::{BlockPlan, BlockWriter, WriteSummary};
pub use processing::sample_buffer::SampleBuffer;
pub use processing::shared_buffer::SharedSampleBuffer;
pub use session::exporter::Exporter;
pub use storage::output_container::OutputContainer;
pub use traits::container_backend::{AudioBlock, AudioConverter, ContainerBackend, EncoderHandle};
pub use traits::export_delegate::ExportDelegate;
pub use traits::sample_source::SampleSource;
