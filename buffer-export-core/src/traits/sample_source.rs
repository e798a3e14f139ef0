use crate::models::error::ExportError;
use crate::processing::sample_buffer::SampleBuffer;

/// Access to the buffer being exported.
///
/// Implemented by whatever owns the audio. `with_samples` holds the owner's
/// read lock for the duration of `f`, so the samples cannot be resized or
/// freed while the export streams them.
pub trait SampleSource: Send + Sync {
    /// Human-readable name used in log messages.
    fn name(&self) -> &str;

    /// Lock the buffer for reading and run `f` over it.
    ///
    /// Fails with `InvalidSource` when the buffer no longer exists.
    fn with_samples<R>(&self, f: impl FnOnce(&SampleBuffer<'_>) -> R) -> Result<R, ExportError>;
}

impl SampleSource for SampleBuffer<'_> {
    fn name(&self) -> &str {
        "buffer"
    }

    fn with_samples<R>(&self, f: impl FnOnce(&SampleBuffer<'_>) -> R) -> Result<R, ExportError> {
        Ok(f(self))
    }
}
