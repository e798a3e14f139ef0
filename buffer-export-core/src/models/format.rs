//! Stream format descriptions for the source (client) and destination
//! (file) sides of an export.
//!
//! The source side is fully specified PCM. The destination side is a request:
//! only the codec, channel count and sample rate are filled in, and the
//! encoder decides packet sizing, bit depth and interleaving.

use serde::{Deserialize, Serialize};

use super::error::ExportError;

/// Size of one 32-bit float sample in bytes.
pub const BYTES_PER_FLOAT_SAMPLE: u32 = 4;

/// Identifies the sample encoding of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatId {
    LinearPcm,
    Mpeg4Aac,
}

/// MPEG-4 audio object type requested from the AAC encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AacObjectType {
    /// AAC Low Complexity, the profile every MPEG-4 audio player decodes.
    LowComplexity,
}

/// Codec-specific flags attached to a `StreamFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFlags {
    Pcm {
        is_float: bool,
        is_packed: bool,
        is_non_interleaved: bool,
    },
    Aac(AacObjectType),
}

/// Description of a PCM or compressed sample layout.
///
/// Fields a compressed format leaves to the encoder are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub format_id: FormatId,
    pub sample_rate: f64,
    pub channels: u16,
    pub bits_per_channel: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub bytes_per_packet: u32,
    pub flags: FormatFlags,
}

impl StreamFormat {
    pub fn is_pcm(&self) -> bool {
        self.format_id == FormatId::LinearPcm
    }

    /// Whether samples of all channels share one buffer, frame by frame.
    pub fn is_interleaved(&self) -> bool {
        match self.flags {
            FormatFlags::Pcm { is_non_interleaved, .. } => !is_non_interleaved,
            FormatFlags::Aac(_) => true,
        }
    }
}

/// Build the client format: packed, interleaved 32-bit float PCM.
///
/// Matches the physical layout of a `SampleBuffer`.
pub fn source_format(sample_rate: f64, channels: u16) -> StreamFormat {
    let bytes_per_frame = BYTES_PER_FLOAT_SAMPLE * channels as u32;
    StreamFormat {
        format_id: FormatId::LinearPcm,
        sample_rate,
        channels,
        bits_per_channel: BYTES_PER_FLOAT_SAMPLE * 8,
        // uncompressed audio always has one frame per packet
        frames_per_packet: 1,
        bytes_per_frame,
        bytes_per_packet: bytes_per_frame,
        flags: FormatFlags::Pcm {
            is_float: true,
            is_packed: true,
            is_non_interleaved: false,
        },
    }
}

/// Build the file format request: AAC-LC with the given rate and channels.
pub fn destination_format(sample_rate: f64, channels: u16) -> StreamFormat {
    StreamFormat {
        format_id: FormatId::Mpeg4Aac,
        sample_rate,
        channels,
        bits_per_channel: 0,
        frames_per_packet: 0,
        bytes_per_frame: 0,
        bytes_per_packet: 0,
        flags: FormatFlags::Aac(AacObjectType::LowComplexity),
    }
}

/// Check that source and destination agree on channel count and sample rate.
pub fn ensure_compatible(source: &StreamFormat, destination: &StreamFormat) -> Result<(), ExportError> {
    if source.channels != destination.channels {
        return Err(ExportError::Configuration(format!(
            "channel count mismatch: source {} vs destination {}",
            source.channels, destination.channels
        )));
    }
    if source.sample_rate != destination.sample_rate {
        return Err(ExportError::Configuration(format!(
            "sample rate mismatch: source {} Hz vs destination {} Hz",
            source.sample_rate, destination.sample_rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn source_format_stereo_float() {
        let format = source_format(48000.0, 2);
        assert_eq!(format.format_id, FormatId::LinearPcm);
        assert_eq!(format.bits_per_channel, 32);
        assert_eq!(format.frames_per_packet, 1);
        assert_eq!(format.bytes_per_frame, 8);
        assert_eq!(format.bytes_per_packet, 8);
        assert!(format.is_interleaved());
        assert_relative_eq!(format.sample_rate, 48000.0);
    }

    #[test]
    fn source_format_byte_sizes_scale_with_channels() {
        for channels in 1..=8u16 {
            let format = source_format(44100.0, channels);
            assert_eq!(format.bytes_per_frame, 4 * channels as u32);
        }
    }

    #[test]
    fn destination_format_leaves_packet_layout_to_encoder() {
        let format = destination_format(44100.0, 1);
        assert_eq!(format.format_id, FormatId::Mpeg4Aac);
        assert_eq!(format.channels, 1);
        assert_eq!(format.bits_per_channel, 0);
        assert_eq!(format.frames_per_packet, 0);
        assert_eq!(format.bytes_per_frame, 0);
        assert_eq!(format.bytes_per_packet, 0);
        assert_eq!(format.flags, FormatFlags::Aac(AacObjectType::LowComplexity));
    }

    #[test]
    fn matching_formats_are_compatible() {
        let src = source_format(48000.0, 2);
        let dst = destination_format(48000.0, 2);
        assert!(ensure_compatible(&src, &dst).is_ok());
    }

    #[test]
    fn channel_mismatch_is_configuration_error() {
        let src = source_format(48000.0, 2);
        let dst = destination_format(48000.0, 1);
        assert!(matches!(ensure_compatible(&src, &dst), Err(ExportError::Configuration(_))));
    }

    #[test]
    fn sample_rate_mismatch_is_configuration_error() {
        let src = source_format(48000.0, 2);
        let dst = destination_format(44100.0, 2);
        assert!(matches!(ensure_compatible(&src, &dst), Err(ExportError::Configuration(_))));
    }
}
