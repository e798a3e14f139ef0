//! Streams a sample buffer into an output container in fixed-size blocks.
//!
//! Layout for `total` frames with block size `B`:
//! ```text
//! [block 0: B frames] [block 1: B frames] ... [remainder: total % B frames]
//! ```
//! The remainder block is only written when non-empty, and it declares its own
//! byte size rather than the full block's.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::error::ExportError;
use crate::models::format::BYTES_PER_FLOAT_SAMPLE;
use crate::processing::sample_buffer::SampleBuffer;
use crate::storage::output_container::OutputContainer;
use crate::traits::container_backend::{AudioBlock, EncoderHandle};

/// Position and length of one block within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub index: usize,
    pub frame_offset: usize,
    pub frames: usize,
}

impl BlockRange {
    /// Declared payload size in bytes for 32-bit float samples.
    pub fn byte_size(&self, channels: u16) -> u64 {
        self.frames as u64 * channels as u64 * BYTES_PER_FLOAT_SAMPLE as u64
    }
}

/// How a buffer of `total_frames` splits into full blocks and a remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    pub block_frames: usize,
    pub full_blocks: usize,
    pub remainder: usize,
}

impl BlockPlan {
    /// `block_frames` must be non-zero; `BlockWriter::new` enforces it.
    pub(crate) fn new(total_frames: usize, block_frames: usize) -> Self {
        let full_blocks = total_frames / block_frames;
        Self {
            block_frames,
            full_blocks,
            remainder: total_frames - full_blocks * block_frames,
        }
    }

    pub fn total_frames(&self) -> usize {
        self.full_blocks * self.block_frames + self.remainder
    }

    /// Number of write calls the plan issues.
    pub fn write_count(&self) -> usize {
        self.full_blocks + usize::from(self.remainder > 0)
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockRange> + '_ {
        let full = (0..self.full_blocks).map(move |index| BlockRange {
            index,
            frame_offset: index * self.block_frames,
            frames: self.block_frames,
        });
        let rest = (self.remainder > 0).then(|| BlockRange {
            index: self.full_blocks,
            frame_offset: self.full_blocks * self.block_frames,
            frames: self.remainder,
        });
        full.chain(rest)
    }
}

/// Totals from a completed `write_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    pub blocks_written: usize,
    pub frames_written: u64,
}

/// Sequential block writer.
#[derive(Debug, Clone)]
pub struct BlockWriter {
    block_frames: usize,
}

impl BlockWriter {
    pub fn new(block_frames: usize) -> Result<Self, ExportError> {
        if block_frames == 0 {
            return Err(ExportError::Configuration(
                "block size must be at least one frame".into(),
            ));
        }
        Ok(Self { block_frames })
    }

    pub fn block_frames(&self) -> usize {
        self.block_frames
    }

    pub fn plan(&self, total_frames: usize) -> BlockPlan {
        BlockPlan::new(total_frames, self.block_frames)
    }

    /// Write every frame of `buffer` into `container`.
    ///
    /// Stops at the first failed block; later blocks are not attempted.
    /// `cancel` is checked before each block. `on_block` receives the running
    /// frame total after each successful write.
    pub fn write_all<H: EncoderHandle>(
        &self,
        buffer: &SampleBuffer<'_>,
        container: &mut OutputContainer<H>,
        cancel: Option<&AtomicBool>,
        mut on_block: impl FnMut(u64),
    ) -> Result<WriteSummary, ExportError> {
        let channels = buffer.channels();
        let plan = self.plan(buffer.frame_count());
        let mut summary = WriteSummary::default();

        for range in plan.blocks() {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                return Err(ExportError::Cancelled {
                    frames_written: summary.frames_written,
                });
            }

            let write_error = |reason: String| ExportError::Write {
                block: range.index,
                reason,
            };
            let byte_size = u32::try_from(range.byte_size(channels))
                .map_err(|_| write_error(format!("block of {} frames exceeds 4 GiB", range.frames)))?;
            let frames = u32::try_from(range.frames)
                .map_err(|_| write_error(format!("block of {} frames is too large", range.frames)))?;

            let block = AudioBlock {
                channels,
                data: buffer.frames(range.frame_offset, range.frames),
                byte_size,
            };

            container.write(frames, &block).map_err(|e| match e {
                ExportError::ClientFormat(_) => e,
                ExportError::Write { reason, .. } => write_error(reason),
                other => write_error(other.to_string()),
            })?;

            summary.blocks_written += 1;
            summary.frames_written += range.frames as u64;
            on_block(summary.frames_written);
        }

        log::debug!(
            "Wrote {} frames in {} blocks ({} full, remainder {})",
            summary.frames_written,
            summary.blocks_written,
            plan.full_blocks,
            plan.remainder
        );
        Ok(summary)
    }
}

impl Default for BlockWriter {
    fn default() -> Self {
        Self {
            block_frames: crate::models::request::DEFAULT_BLOCK_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::models::format::{destination_format, source_format};
    use crate::models::request::FileType;
    use crate::test_support::{Call, Failures, RecordingBackend, RecordingHandle};

    fn open(backend: &RecordingBackend, channels: u16) -> OutputContainer<RecordingHandle> {
        let mut container = OutputContainer::open(
            backend,
            Path::new("/tmp/blocks.m4a"),
            FileType::M4a,
            &destination_format(48000.0, channels),
            true,
        )
        .unwrap();
        container
            .negotiate_client_format(&source_format(48000.0, channels))
            .unwrap();
        container
    }

    fn ramp(frames: usize, channels: u16) -> Vec<f32> {
        (0..frames * channels as usize).map(|i| i as f32).collect()
    }

    #[test]
    fn plan_splits_full_blocks_and_remainder() {
        let plan = BlockPlan::new(10000, 8192);
        assert_eq!(plan.full_blocks, 1);
        assert_eq!(plan.remainder, 1808);
        assert_eq!(plan.write_count(), 2);
    }

    #[test]
    fn plan_exact_multiple_has_no_remainder() {
        let plan = BlockPlan::new(16384, 8192);
        assert_eq!(plan.full_blocks, 2);
        assert_eq!(plan.remainder, 0);
        assert_eq!(plan.write_count(), 2);
        assert_eq!(plan.blocks().count(), 2);
    }

    #[test]
    fn plan_covers_every_frame_once() {
        for total in [0usize, 1, 7, 8, 9, 63, 64, 65, 1000] {
            for block in [1usize, 3, 8, 64, 4096] {
                let plan = BlockPlan::new(total, block);
                let blocks: Vec<BlockRange> = plan.blocks().collect();
                assert_eq!(blocks.len(), total.div_ceil(block));
                assert_eq!(blocks.iter().map(|b| b.frames).sum::<usize>(), total);
                let mut expected_offset = 0;
                for (i, range) in blocks.iter().enumerate() {
                    assert_eq!(range.index, i);
                    assert_eq!(range.frame_offset, expected_offset);
                    expected_offset += range.frames;
                }
                assert_eq!(plan.total_frames(), total);
            }
        }
    }

    #[test]
    fn block_byte_size() {
        let range = BlockRange {
            index: 0,
            frame_offset: 8192,
            frames: 1808,
        };
        assert_eq!(range.byte_size(2), 1808 * 2 * 4);
    }

    #[test]
    fn writes_full_blocks_then_remainder() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 2);
        let samples = ramp(10000, 2);
        let buffer = SampleBuffer::new(&samples, 2, 48000.0).unwrap();

        let summary = BlockWriter::new(8192)
            .unwrap()
            .write_all(&buffer, &mut container, None, |_| {})
            .unwrap();

        assert_eq!(summary.blocks_written, 2);
        assert_eq!(summary.frames_written, 10000);
        assert_eq!(backend.writes(), vec![(8192, 8192 * 2 * 4), (1808, 1808 * 2 * 4)]);
    }

    #[test]
    fn remainder_byte_size_differs_from_full_block() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 3);
        let samples = ramp(100, 3);
        let buffer = SampleBuffer::new(&samples, 3, 48000.0).unwrap();

        BlockWriter::new(32)
            .unwrap()
            .write_all(&buffer, &mut container, None, |_| {})
            .unwrap();

        let writes = backend.writes();
        let (last_frames, last_bytes) = *writes.last().unwrap();
        assert_eq!(last_frames, 4);
        assert_eq!(last_bytes, 4 * 3 * 4);
        assert_ne!(last_bytes, writes[0].1);
    }

    #[test]
    fn blocks_start_at_consecutive_offsets() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 2);
        let samples = ramp(25, 2);
        let buffer = SampleBuffer::new(&samples, 2, 48000.0).unwrap();

        BlockWriter::new(10)
            .unwrap()
            .write_all(&buffer, &mut container, None, |_| {})
            .unwrap();

        let firsts: Vec<Option<f32>> = backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Write { first_sample, .. } => Some(first_sample),
                _ => None,
            })
            .collect();
        assert_eq!(firsts, vec![Some(0.0), Some(20.0), Some(40.0)]);
    }

    #[test]
    fn empty_buffer_writes_nothing() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 2);
        let buffer = SampleBuffer::new(&[], 2, 48000.0).unwrap();

        let summary = BlockWriter::default()
            .write_all(&buffer, &mut container, None, |_| {})
            .unwrap();

        assert_eq!(summary, WriteSummary::default());
        assert!(backend.writes().is_empty());
    }

    #[test]
    fn stops_at_first_failed_block() {
        let backend = RecordingBackend::failing(Failures {
            write_at: Some(1),
            ..Default::default()
        });
        let mut container = open(&backend, 1);
        let samples = ramp(50, 1);
        let buffer = SampleBuffer::new(&samples, 1, 48000.0).unwrap();

        let err = BlockWriter::new(10)
            .unwrap()
            .write_all(&buffer, &mut container, None, |_| {})
            .unwrap_err();

        assert!(matches!(err, ExportError::Write { block: 1, .. }));
        assert_eq!(backend.writes().len(), 2);
    }

    #[test]
    fn cancellation_checked_between_blocks() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 1);
        let samples = ramp(50, 1);
        let buffer = SampleBuffer::new(&samples, 1, 48000.0).unwrap();
        let cancel = AtomicBool::new(false);

        let err = BlockWriter::new(10)
            .unwrap()
            .write_all(&buffer, &mut container, Some(&cancel), |written| {
                if written >= 20 {
                    cancel.store(true, Ordering::SeqCst);
                }
            })
            .unwrap_err();

        assert_eq!(err, ExportError::Cancelled { frames_written: 20 });
        assert_eq!(backend.writes().len(), 2);
    }

    #[test]
    fn progress_reports_running_total() {
        let backend = RecordingBackend::default();
        let mut container = open(&backend, 2);
        let samples = ramp(25, 2);
        let buffer = SampleBuffer::new(&samples, 2, 48000.0).unwrap();
        let mut seen = Vec::new();

        BlockWriter::new(10)
            .unwrap()
            .write_all(&buffer, &mut container, None, |written| seen.push(written))
            .unwrap();

        assert_eq!(seen, vec![10, 20, 25]);
    }

    #[test]
    fn zero_block_size_is_configuration_error() {
        assert!(matches!(BlockWriter::new(0), Err(ExportError::Configuration(_))));
        assert_eq!(BlockWriter::new(1).unwrap().block_frames(), 1);
    }
}
