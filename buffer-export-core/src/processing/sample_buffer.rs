use crate::models::error::ExportError;

/// Read-only view over interleaved 32-bit float samples.
///
/// Frame `n` of channel `c` lives at index `n * channels + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBuffer<'a> {
    samples: &'a [f32],
    channels: u16,
    sample_rate: f64,
}

impl<'a> SampleBuffer<'a> {
    /// Wrap `samples`, checking that the layout is usable for export.
    pub fn new(samples: &'a [f32], channels: u16, sample_rate: f64) -> Result<Self, ExportError> {
        if channels == 0 {
            return Err(ExportError::InvalidSource("channel count must be at least 1".into()));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ExportError::InvalidSource(format!("invalid sample rate: {}", sample_rate)));
        }
        if samples.len() % channels as usize != 0 {
            return Err(ExportError::InvalidSource(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate
    }

    /// Interleaved samples of `count` frames starting at frame `start`.
    ///
    /// Panics if the range exceeds the buffer, like slice indexing.
    pub fn frames(&self, start: usize, count: usize) -> &'a [f32] {
        let channels = self.channels as usize;
        &self.samples[start * channels..(start + count) * channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_count_stereo() {
        let samples = vec![0.0f32; 20];
        let buffer = SampleBuffer::new(&samples, 2, 48000.0).unwrap();
        assert_eq!(buffer.frame_count(), 10);
        assert_eq!(buffer.channels(), 2);
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buffer = SampleBuffer::new(&[], 2, 44100.0).unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_relative_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(matches!(
            SampleBuffer::new(&[0.0; 4], 0, 48000.0),
            Err(ExportError::InvalidSource(_))
        ));
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        assert!(SampleBuffer::new(&[0.0; 4], 1, 0.0).is_err());
        assert!(SampleBuffer::new(&[0.0; 4], 1, -48000.0).is_err());
        assert!(SampleBuffer::new(&[0.0; 4], 1, f64::NAN).is_err());
    }

    #[test]
    fn rejects_partial_frame() {
        assert!(SampleBuffer::new(&[0.0; 5], 2, 48000.0).is_err());
    }

    #[test]
    fn frames_slice_is_interleaved() {
        let samples: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let buffer = SampleBuffer::new(&samples, 3, 48000.0).unwrap();
        assert_eq!(buffer.frames(1, 2), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn duration() {
        let samples = vec![0.0f32; 96000];
        let buffer = SampleBuffer::new(&samples, 2, 48000.0).unwrap();
        assert_relative_eq!(buffer.duration_secs(), 1.0);
    }
}
