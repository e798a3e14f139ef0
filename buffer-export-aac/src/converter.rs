//! AAC-LC encoder configuration and the `AudioConverter` implementation.

use buffer_export_core::{AudioConverter, ExportError};
use mp4::{ChannelConfig, SampleFreqIndex};

use crate::encoder::AacEncoder;
use crate::error::AacError;

/// Lowest CBR rate the encoder accepts per channel.
pub const MIN_BIT_RATE_PER_CHANNEL: u32 = 8_000;

/// Highest CBR rate accepted per channel, before the frame-size limit.
pub const MAX_BIT_RATE_PER_CHANNEL: u32 = 320_000;

/// AAC-LC caps an access unit at 6144 bits per channel per 1024 samples.
const MAX_BITS_PER_CHANNEL_PER_SAMPLE: u32 = 6;

/// Map a sample rate onto the MPEG-4 sampling frequency table.
pub fn sample_freq_index(sample_rate: f64) -> Result<SampleFreqIndex, AacError> {
    let index = match sample_rate as u32 {
        _ if sample_rate.fract() != 0.0 => return Err(AacError::UnsupportedSampleRate(sample_rate)),
        96000 => SampleFreqIndex::Freq96000,
        88200 => SampleFreqIndex::Freq88200,
        64000 => SampleFreqIndex::Freq64000,
        48000 => SampleFreqIndex::Freq48000,
        44100 => SampleFreqIndex::Freq44100,
        32000 => SampleFreqIndex::Freq32000,
        24000 => SampleFreqIndex::Freq24000,
        22050 => SampleFreqIndex::Freq22050,
        16000 => SampleFreqIndex::Freq16000,
        12000 => SampleFreqIndex::Freq12000,
        11025 => SampleFreqIndex::Freq11025,
        8000 => SampleFreqIndex::Freq8000,
        _ => return Err(AacError::UnsupportedSampleRate(sample_rate)),
    };
    Ok(index)
}

/// Channel configuration for the channel counts the encoder supports.
pub fn channel_config(channels: u16) -> Result<ChannelConfig, AacError> {
    match channels {
        1 => Ok(ChannelConfig::Mono),
        2 => Ok(ChannelConfig::Stereo),
        3 => Ok(ChannelConfig::Three),
        4 => Ok(ChannelConfig::Four),
        5 => Ok(ChannelConfig::Five),
        6 => Ok(ChannelConfig::FiveOne),
        8 => Ok(ChannelConfig::SevenOne),
        n => Err(AacError::UnsupportedChannels(n)),
    }
}

/// Valid CBR range in bits per second for a stream.
pub fn bit_rate_range(sample_rate: u32, channels: u16) -> (u32, u32) {
    let channels = channels as u32;
    let frame_limit = sample_rate.saturating_mul(MAX_BITS_PER_CHANNEL_PER_SAMPLE);
    (
        MIN_BIT_RATE_PER_CHANNEL * channels,
        MAX_BIT_RATE_PER_CHANNEL.min(frame_limit) * channels,
    )
}

/// Encoder settings collected before the first write.
///
/// The encoder itself is created lazily because its bit rate is fixed at
/// construction; once it exists the bit rate can no longer change.
#[derive(Debug)]
pub struct AacConverter {
    sample_rate: u32,
    channels: u16,
    bit_rate: Option<u32>,
    started: bool,
}

impl AacConverter {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_rate: None,
            started: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Build the encoder with the current settings and freeze them.
    pub fn start(&mut self) -> Result<AacEncoder, AacError> {
        let encoder = AacEncoder::new(self.sample_rate, self.channels, self.bit_rate)?;
        self.started = true;
        match self.bit_rate {
            Some(bps) => log::debug!("AAC encoder started: {} Hz, {} ch, {} bps", self.sample_rate, self.channels, bps),
            None => log::debug!("AAC encoder started: {} Hz, {} ch, default VBR", self.sample_rate, self.channels),
        }
        Ok(encoder)
    }
}

impl AudioConverter for AacConverter {
    fn set_encode_bit_rate(&mut self, bits_per_second: u32) -> Result<(), ExportError> {
        let rejected = |reason: String| ExportError::BitRateRejected {
            requested: bits_per_second,
            reason,
        };
        if self.started {
            return Err(rejected("encoder already running".into()));
        }
        let (min, max) = bit_rate_range(self.sample_rate, self.channels);
        if !(min..=max).contains(&bits_per_second) {
            return Err(rejected(format!("valid range is {}..={} bps", min, max)));
        }
        self.bit_rate = Some(bits_per_second);
        Ok(())
    }

    fn encode_bit_rate(&self) -> Option<u32> {
        self.bit_rate
    }
}
