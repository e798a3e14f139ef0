use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::error::ExportError;
use crate::processing::sample_buffer::SampleBuffer;
use crate::traits::sample_source::SampleSource;

#[derive(Debug)]
struct OwnedSamples {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: f64,
}

/// Named, shareable sample buffer owned outside the export.
///
/// Clones share the same storage. The owner may replace or free the contents
/// at any time; an export in progress holds the read lock, so those calls
/// block until it finishes.
#[derive(Debug, Clone)]
pub struct SharedSampleBuffer {
    name: String,
    inner: Arc<RwLock<Option<OwnedSamples>>>,
}

impl SharedSampleBuffer {
    pub fn new(name: impl Into<String>, samples: Vec<f32>, channels: u16, sample_rate: f64) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(RwLock::new(Some(OwnedSamples {
                samples,
                channels,
                sample_rate,
            }))),
        }
    }

    /// Swap in new contents.
    pub fn replace(&self, samples: Vec<f32>, channels: u16, sample_rate: f64) {
        *self.inner.write() = Some(OwnedSamples {
            samples,
            channels,
            sample_rate,
        });
    }

    /// Drop the contents. Later exports fail with `InvalidSource`.
    pub fn free(&self) {
        *self.inner.write() = None;
    }

    pub fn is_freed(&self) -> bool {
        self.inner.read().is_none()
    }

    pub fn frame_count(&self) -> usize {
        self.inner
            .read()
            .as_ref()
            .map(|owned| owned.samples.len() / owned.channels.max(1) as usize)
            .unwrap_or(0)
    }
}

impl SampleSource for SharedSampleBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn with_samples<R>(&self, f: impl FnOnce(&SampleBuffer<'_>) -> R) -> Result<R, ExportError> {
        let guard = self.inner.read();
        let owned = guard
            .as_ref()
            .ok_or_else(|| ExportError::InvalidSource(format!("{} is no valid source buffer", self.name)))?;
        let buffer = SampleBuffer::new(&owned.samples, owned.channels, owned.sample_rate)?;
        Ok(f(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_through_lock() {
        let shared = SharedSampleBuffer::new("drums", vec![0.5; 8], 2, 48000.0);
        let frames = shared.with_samples(|buffer| buffer.frame_count()).unwrap();
        assert_eq!(frames, 4);
        assert_eq!(shared.name(), "drums");
    }

    #[test]
    fn freed_buffer_is_invalid_source() {
        let shared = SharedSampleBuffer::new("drums", vec![0.5; 8], 2, 48000.0);
        shared.free();
        assert!(shared.is_freed());
        let result = shared.with_samples(|buffer| buffer.frame_count());
        assert!(matches!(result, Err(ExportError::InvalidSource(_))));
    }

    #[test]
    fn clones_share_storage() {
        let shared = SharedSampleBuffer::new("pad", vec![0.0; 4], 1, 44100.0);
        let other = shared.clone();
        other.replace(vec![0.0; 10], 1, 44100.0);
        assert_eq!(shared.frame_count(), 10);
    }

    #[test]
    fn malformed_contents_are_invalid_source() {
        let shared = SharedSampleBuffer::new("odd", vec![0.0; 3], 2, 48000.0);
        assert!(matches!(
            shared.with_samples(|_| ()),
            Err(ExportError::InvalidSource(_))
        ));
    }
}
