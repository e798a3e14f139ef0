use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use buffer_export_core::{ContainerBackend, ExportError, FileType, FormatId, StreamFormat};
use mp4::{FourCC, Mp4Config, Mp4Writer};

use crate::converter::{self, AacConverter};
use crate::error::AacError;
use crate::handle::AacFileHandle;

/// Movie timescale of the container header, in ticks per second.
const MOVIE_TIMESCALE: u32 = 1000;

/// Creates `.m4a` files holding one AAC-LC track.
#[derive(Debug, Clone, Copy, Default)]
pub struct AacFileBackend;

impl AacFileBackend {
    pub fn new() -> Self {
        Self
    }

    fn open_file(path: &Path, overwrite: bool) -> Result<File, AacError> {
        let file = if overwrite {
            File::create(path)?
        } else {
            OpenOptions::new().write(true).create_new(true).open(path)?
        };
        Ok(file)
    }

    fn start_container(file: File) -> Result<Mp4Writer<BufWriter<File>>, AacError> {
        let config = Mp4Config {
            major_brand: "M4A ".parse::<FourCC>()?,
            minor_version: 512,
            compatible_brands: vec![
                "M4A ".parse::<FourCC>()?,
                "mp42".parse::<FourCC>()?,
                "isom".parse::<FourCC>()?,
            ],
            timescale: MOVIE_TIMESCALE,
        };
        Ok(Mp4Writer::write_start(BufWriter::new(file), &config)?)
    }
}

impl ContainerBackend for AacFileBackend {
    type Handle = AacFileHandle;

    fn create(
        &self,
        path: &Path,
        file_type: FileType,
        format: &StreamFormat,
        overwrite: bool,
    ) -> Result<Self::Handle, ExportError> {
        match file_type {
            FileType::M4a => {}
        }
        if format.format_id != FormatId::Mpeg4Aac {
            return Err(ExportError::ContainerCreate(format!(
                "{:?} cannot be stored in an {} file",
                format.format_id,
                file_type.extension()
            )));
        }
        converter::sample_freq_index(format.sample_rate).map_err(AacError::into_create_error)?;
        converter::channel_config(format.channels).map_err(AacError::into_create_error)?;

        let file = Self::open_file(path, overwrite)
            .map_err(|e| ExportError::ContainerCreate(format!("cannot create {}: {}", path.display(), e)))?;
        let writer = match Self::start_container(file) {
            Ok(writer) => writer,
            Err(e) => {
                fs::remove_file(path).ok();
                return Err(e.into_create_error());
            }
        };

        log::debug!(
            "Created {} ({} Hz, {} ch)",
            path.display(),
            format.sample_rate,
            format.channels
        );
        let converter = AacConverter::new(format.sample_rate as u32, format.channels);
        Ok(AacFileHandle::new(path, writer, converter))
    }
}
