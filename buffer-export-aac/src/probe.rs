use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mp4::{ChannelConfig, MediaType, Mp4Reader, TrackType};

use crate::error::AacError;

/// Stream parameters read back from a container's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    pub codec: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub packets: u32,
    pub duration_secs: f64,
}

/// Read the first audio track's parameters from an MPEG-4 file.
///
/// Only box headers and the sample table are read; no audio is decoded.
pub fn probe(path: &Path) -> Result<ContainerInfo, AacError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let reader = Mp4Reader::read_header(BufReader::new(file), size)?;

    for track in reader.tracks().values() {
        if track.track_type()? != TrackType::Audio {
            continue;
        }
        let codec = match track.media_type()? {
            MediaType::AAC => "aac".to_string(),
            other => format!("{:?}", other).to_lowercase(),
        };
        return Ok(ContainerInfo {
            codec,
            channels: channel_count(track.channel_config()?),
            sample_rate: track.sample_freq_index()?.freq(),
            packets: track.sample_count(),
            duration_secs: track.duration().as_secs_f64(),
        });
    }
    Err(AacError::NoAudioTrack)
}

fn channel_count(config: ChannelConfig) -> u16 {
    match config {
        ChannelConfig::Mono => 1,
        ChannelConfig::Stereo => 2,
        ChannelConfig::Three => 3,
        ChannelConfig::Four => 4,
        ChannelConfig::Five => 5,
        ChannelConfig::FiveOne => 6,
        ChannelConfig::SevenOne => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(probe(Path::new("/nonexistent/file.m4a")), Err(AacError::Io(_))));
    }

    #[test]
    fn channel_counts() {
        assert_eq!(channel_count(ChannelConfig::Mono), 1);
        assert_eq!(channel_count(ChannelConfig::FiveOne), 6);
        assert_eq!(channel_count(ChannelConfig::SevenOne), 8);
    }
}
