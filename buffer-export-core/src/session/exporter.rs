use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::ExportError;
use crate::models::export_result::{ExportMetadata, ExportReport};
use crate::models::format;
use crate::models::request::ExportRequest;
use crate::models::state::ExportState;
use crate::processing::block_writer::BlockWriter;
use crate::processing::sample_buffer::SampleBuffer;
use crate::storage::output_container::OutputContainer;
use crate::storage::{checksum, metadata};
use crate::traits::container_backend::ContainerBackend;
use crate::traits::export_delegate::ExportDelegate;
use crate::traits::sample_source::SampleSource;

/// Export orchestrator.
///
/// Generic over the container family via `ContainerBackend`. Each call to
/// `export` runs one request to completion on the calling thread:
/// ```text
/// [SampleSource] → read lock → formats → [OutputContainer] → [BlockWriter] → close → checksum
/// ```
/// The exporter keeps no state between calls other than the last outcome,
/// so a failed export is retried by issuing a new request.
pub struct Exporter<B: ContainerBackend> {
    backend: B,
    state: Mutex<ExportState>,
    delegate: Option<Arc<dyn ExportDelegate>>,
    running: AtomicBool,
    cancel: Arc<AtomicBool>,
}

impl<B: ContainerBackend> Exporter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(ExportState::Idle),
            delegate: None,
            running: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn ExportDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// State of the current or most recent export.
    pub fn state(&self) -> ExportState {
        self.state.lock().clone()
    }

    /// Ask the running export to stop before its next block.
    ///
    /// The request stays pending until an export observes it, so a cancel
    /// that arrives before `export` starts stops that export before its first
    /// block. Every export clears the flag when it finishes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared flag for cancelling from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Export one buffer. Blocks until the file is closed.
    pub fn export<S: SampleSource>(&self, request: &ExportRequest<'_, S>) -> Result<ExportReport, ExportError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ExportError::Configuration("an export is already in progress".into()));
        }

        self.set_state(ExportState::Idle);

        let result = request
            .validate()
            .and_then(|()| {
                let source = request.source();
                log::info!("Exporting {} to {}", source.name(), request.path().display());
                source.with_samples(|buffer| self.run(request, buffer))
            })
            .and_then(|inner| inner);

        match &result {
            Ok(report) => {
                log::info!(
                    "Export finished: {} frames in {} blocks to {}",
                    report.frames_written,
                    report.blocks_written,
                    report.file_path.display()
                );
                self.set_state(ExportState::Completed(Box::new(report.clone())));
                if let Some(ref delegate) = self.delegate {
                    delegate.on_export_finished(report);
                }
            }
            Err(e) => {
                log::error!("Export to {} failed: {}", request.path().display(), e);
                self.set_state(ExportState::Failed(e.clone()));
            }
        }

        self.cancel.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn run<S: SampleSource>(
        &self,
        request: &ExportRequest<'_, S>,
        buffer: &SampleBuffer<'_>,
    ) -> Result<ExportReport, ExportError> {
        let options = request.options();
        let path = request.path();
        let total_frames = buffer.frame_count() as u64;

        let source_format = format::source_format(buffer.sample_rate(), buffer.channels());
        let destination_format = format::destination_format(buffer.sample_rate(), buffer.channels());
        self.set_state(ExportState::FormatsBuilt);

        let mut container = OutputContainer::open(
            &self.backend,
            path,
            options.file_type,
            &destination_format,
            options.overwrite,
        )?;
        container.negotiate_client_format(&source_format)?;
        self.set_state(ExportState::ContainerOpen);

        if let Some(bits_per_second) = options.bit_rate_bps() {
            log::info!("Bit rate: {} kbps", options.bit_rate_kbps);
            if let Err(warning) = container.set_bit_rate(bits_per_second) {
                log::warn!("Continuing at encoder default bit rate: {}", warning);
                if let Some(ref delegate) = self.delegate {
                    delegate.on_warning(&warning);
                }
            }
        }
        let applied_bit_rate = container.bit_rate();

        self.set_state(ExportState::Streaming {
            frames_written: 0,
            total_frames,
        });

        let writer = BlockWriter::new(options.block_frames)?;
        let written = writer.write_all(buffer, &mut container, Some(self.cancel.as_ref()), |frames_written| {
            *self.state.lock() = ExportState::Streaming {
                frames_written,
                total_frames,
            };
            if let Some(ref delegate) = self.delegate {
                delegate.on_progress(frames_written, total_frames);
            }
        });

        let summary = match written {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(close_err) = container.close() {
                    log::error!("Failed to close {} after error: {}", path.display(), close_err);
                }
                log::warn!("{} is incomplete and should be discarded", path.display());
                return Err(e);
            }
        };
        container.close()?;

        let checksum = checksum::sha256_file(path)?;
        let export_metadata = ExportMetadata::new(
            &path.to_string_lossy(),
            &checksum,
            options.file_type,
            buffer.channels(),
            buffer.sample_rate(),
            summary.frames_written,
            options.bit_rate_kbps,
            applied_bit_rate,
        );
        if options.write_metadata {
            metadata::write_metadata(&export_metadata, path)?;
        }

        Ok(ExportReport {
            file_path: path.to_path_buf(),
            frames_written: summary.frames_written,
            blocks_written: summary.blocks_written,
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            duration_secs: buffer.duration_secs(),
            bit_rate_bps: applied_bit_rate,
            checksum,
            metadata: export_metadata,
        })
    }

    fn set_state(&self, new_state: ExportState) {
        *self.state.lock() = new_state.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}
