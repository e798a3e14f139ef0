//! Encoder session bound to one `.m4a` file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use buffer_export_core::{AudioBlock, AudioConverter, EncoderHandle, ExportError, FormatFlags, StreamFormat};
use bytes::Bytes;
use mp4::{AacConfig, AudioObjectType, MediaConfig, Mp4Sample, Mp4Writer, TrackConfig, TrackType};

use crate::converter::{self, AacConverter};
use crate::encoder::AacEncoder;
use crate::error::AacError;
use crate::pcm;

const TRACK_ID: u32 = 1;

/// Running encoder plus its packet bookkeeping.
struct EncodeSession {
    encoder: AacEncoder,
    /// Samples per channel in one AAC access unit.
    frame_length: usize,
    /// Encoder look-ahead in samples per channel.
    delay: usize,
    packet: Vec<u8>,
    packets_written: u64,
}

/// Open `.m4a` output: MP4 muxer, AAC encoder, and pending input samples.
///
/// Created by `AacFileBackend::create`. The AAC track is added when the
/// encoder starts, which is the first write or disposal, so the bit rate
/// set in between is recorded in the track's decoder config.
///
/// A failed `write` abandons the file: whatever was already written is
/// flushed as is, no `moov` box follows, and later writes are refused.
pub struct AacFileHandle {
    path: PathBuf,
    writer: Option<Mp4Writer<BufWriter<File>>>,
    converter: AacConverter,
    client_format: Option<StreamFormat>,
    session: Option<EncodeSession>,
    pending: Vec<i16>,
    frames_received: u64,
    failed: bool,
}

impl AacFileHandle {
    pub(crate) fn new(path: &Path, writer: Mp4Writer<BufWriter<File>>, converter: AacConverter) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            converter,
            client_format: None,
            session: None,
            pending: Vec::new(),
            frames_received: 0,
            failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames accepted through `write` so far.
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Whether a write failed and the file was left unfinished.
    pub fn is_abandoned(&self) -> bool {
        self.failed
    }

    fn start_session(&mut self) -> Result<(), AacError> {
        if self.session.is_some() {
            return Ok(());
        }
        let encoder = self.converter.start()?;
        let info = encoder.info()?;

        let track = TrackConfig {
            track_type: TrackType::Audio,
            timescale: self.converter.sample_rate(),
            language: String::from("und"),
            media_conf: MediaConfig::AacConfig(AacConfig {
                bitrate: self.converter.encode_bit_rate().unwrap_or(0),
                profile: AudioObjectType::AacLowComplexity,
                freq_index: converter::sample_freq_index(self.converter.sample_rate() as f64)?,
                chan_conf: converter::channel_config(self.converter.channels())?,
            }),
        };
        if let Some(writer) = self.writer.as_mut() {
            writer.add_track(&track)?;
        }

        self.session = Some(EncodeSession {
            encoder,
            frame_length: info.frame_length,
            delay: info.delay,
            packet: vec![0u8; info.max_packet_bytes],
            packets_written: 0,
        });
        Ok(())
    }

    /// Encode whole AAC frames out of `pending`, keeping any tail.
    ///
    /// Each frame leaves `pending` as soon as it is encoded.
    fn drain_pending(&mut self) -> Result<(), AacError> {
        let channels = self.converter.channels() as usize;
        let (Some(session), Some(writer)) = (self.session.as_mut(), self.writer.as_mut()) else {
            return Ok(());
        };
        let frame_samples = session.frame_length * channels;
        while self.pending.len() >= frame_samples {
            encode_frame(session, writer, &self.pending[..frame_samples])?;
            self.pending.drain(..frame_samples);
        }
        Ok(())
    }

    /// Pad the tail to a whole frame, then push silence through the
    /// encoder look-ahead so the last real samples come out.
    fn flush(&mut self) -> Result<(), AacError> {
        let channels = self.converter.channels() as usize;
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let frame_samples = session.frame_length * channels;
        let delay_frames = session.delay.div_ceil(session.frame_length) + 1;

        let has_audio = self.frames_received > 0;
        let tail = self.pending.len() % frame_samples;
        if tail > 0 {
            self.pending.resize(self.pending.len() + frame_samples - tail, 0);
        }
        if has_audio {
            self.pending.resize(self.pending.len() + delay_frames * frame_samples, 0);
        }
        self.drain_pending()
    }

    /// Flush the encoder and write the moov box.
    fn finalize(&mut self) -> Result<(), AacError> {
        self.start_session()?;
        self.flush()?;
        if let Some(mut writer) = self.writer.take() {
            writer.write_end()?;
            writer.into_writer().flush()?;
        }
        Ok(())
    }

    /// Stop writing: push out buffered bytes and release the file.
    fn abandon(&mut self) {
        self.failed = true;
        self.pending.clear();
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.into_writer().flush() {
                log::warn!("Failed to flush abandoned {}: {}", self.path.display(), e);
            }
            log::warn!("Abandoned {} after a failed write", self.path.display());
        }
    }

    fn write_block(&mut self, frames: u32, block: &AudioBlock<'_>) -> Result<(), ExportError> {
        let Some(format) = self.client_format else {
            return Err(ExportError::ClientFormat("client format not set".into()));
        };
        let expected_samples = frames as usize * format.channels as usize;
        if block.channels != format.channels || block.data.len() != expected_samples {
            return Err(AacError::Encoder(format!(
                "block holds {} samples, expected {} frames of {} channels",
                block.data.len(),
                frames,
                format.channels
            ))
            .into_write_error());
        }
        if block.byte_size as u64 != frames as u64 * format.bytes_per_frame as u64 {
            return Err(AacError::Encoder(format!(
                "declared {} bytes for {} frames of {} bytes",
                block.byte_size, frames, format.bytes_per_frame
            ))
            .into_write_error());
        }

        self.start_session().map_err(AacError::into_write_error)?;
        pcm::convert_to_int16(block.data, &mut self.pending);
        self.frames_received += frames as u64;
        self.drain_pending().map_err(AacError::into_write_error)
    }
}

fn encode_frame(
    session: &mut EncodeSession,
    writer: &mut Mp4Writer<BufWriter<File>>,
    frame: &[i16],
) -> Result<(), AacError> {
    let mut input = frame;
    while !input.is_empty() {
        let info = session.encoder.encode(input, &mut session.packet)?;

        if info.output_size > 0 {
            let sample = Mp4Sample {
                start_time: session.packets_written * session.frame_length as u64,
                duration: session.frame_length as u32,
                rendering_offset: 0,
                is_sync: true,
                bytes: Bytes::copy_from_slice(&session.packet[..info.output_size]),
            };
            writer.write_sample(TRACK_ID, &sample)?;
            session.packets_written += 1;
        }
        if info.input_consumed == 0 && info.output_size == 0 {
            return Err(AacError::Encoder("encoder made no progress".into()));
        }
        input = &input[info.input_consumed..];
    }
    Ok(())
}

impl EncoderHandle for AacFileHandle {
    fn set_client_format(&mut self, format: &StreamFormat) -> Result<(), ExportError> {
        let is_float = matches!(format.flags, FormatFlags::Pcm { is_float: true, .. });
        if !format.is_pcm() || !is_float || format.bits_per_channel != 32 {
            return Err(ExportError::ClientFormat("expected 32-bit float PCM".into()));
        }
        if !format.is_interleaved() {
            return Err(ExportError::ClientFormat("expected interleaved samples".into()));
        }
        if format.channels != self.converter.channels() || format.sample_rate as u32 != self.converter.sample_rate() {
            return Err(ExportError::ClientFormat(format!(
                "client layout {} Hz / {} ch does not match file {} Hz / {} ch",
                format.sample_rate,
                format.channels,
                self.converter.sample_rate(),
                self.converter.channels()
            )));
        }
        self.client_format = Some(*format);
        Ok(())
    }

    fn converter(&mut self) -> Result<&mut dyn AudioConverter, ExportError> {
        Ok(&mut self.converter)
    }

    fn write(&mut self, frames: u32, block: &AudioBlock<'_>) -> Result<(), ExportError> {
        if self.failed {
            return Err(AacError::Encoder("file abandoned after an earlier write failure".into()).into_write_error());
        }
        let result = self.write_block(frames, block);
        if matches!(result, Err(ExportError::Write { .. })) {
            self.abandon();
        }
        result
    }

    fn dispose(mut self) -> Result<(), ExportError> {
        if self.failed {
            log::debug!("Closed abandoned {}: {} frames", self.path.display(), self.frames_received);
            return Ok(());
        }
        self.finalize()
            .map_err(|e| ExportError::Storage(format!("failed to finalize {}: {}", self.path.display(), e)))?;
        log::debug!(
            "Closed {}: {} frames, {} packets",
            self.path.display(),
            self.frames_received,
            self.session.as_ref().map_or(0, |s| s.packets_written)
        );
        Ok(())
    }
}
