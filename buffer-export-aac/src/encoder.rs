//! AAC-LC encoder instance over libfdk-aac.
//!
//! Configured for raw access units (no ADTS headers) since the MP4 muxer
//! frames packets itself. Input is interleaved 16-bit PCM in WAV channel
//! order, so 5.1 arrives as L R C LFE Ls Rs.

use std::mem::{self, MaybeUninit};
use std::os::raw::{c_int, c_void};
use std::ptr;

use fdk_aac_sys as sys;

use crate::error::AacError;

/// Bit-rate mode value for the encoder's highest VBR quality.
const VBR_HIGH: u32 = 4;

/// Channel order value selecting WAV (Microsoft) ordering.
const CHANNEL_ORDER_WAV: u32 = 1;

/// Fixed properties of a configured encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderInfo {
    /// Samples per channel in one access unit.
    pub frame_length: usize,
    /// Encoder look-ahead in samples per channel.
    pub delay: usize,
    /// Upper bound on one encoded access unit in bytes.
    pub max_packet_bytes: usize,
}

/// Result of one `encode` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeInfo {
    pub input_consumed: usize,
    pub output_size: usize,
}

/// FDK channel mode for an interleaved channel count.
pub fn channel_mode(channels: u16) -> Result<sys::CHANNEL_MODE, AacError> {
    let mode = match channels {
        1 => sys::CHANNEL_MODE_MODE_1,
        2 => sys::CHANNEL_MODE_MODE_2,
        3 => sys::CHANNEL_MODE_MODE_1_2,
        4 => sys::CHANNEL_MODE_MODE_1_2_1,
        5 => sys::CHANNEL_MODE_MODE_1_2_2,
        6 => sys::CHANNEL_MODE_MODE_1_2_2_1,
        8 => sys::CHANNEL_MODE_MODE_7_1_FRONT_CENTER,
        n => return Err(AacError::UnsupportedChannels(n)),
    };
    Ok(mode)
}

fn check(code: sys::AACENC_ERROR, call: &str) -> Result<(), AacError> {
    if code == sys::AACENC_ERROR_AACENC_OK {
        return Ok(());
    }
    let reason = match code {
        sys::AACENC_ERROR_AACENC_INVALID_HANDLE => "invalid handle",
        sys::AACENC_ERROR_AACENC_MEMORY_ERROR => "memory allocation failed",
        sys::AACENC_ERROR_AACENC_UNSUPPORTED_PARAMETER => "unsupported parameter",
        sys::AACENC_ERROR_AACENC_INVALID_CONFIG => "invalid configuration",
        sys::AACENC_ERROR_AACENC_INIT_ERROR => "initialization failed",
        sys::AACENC_ERROR_AACENC_INIT_AAC_ERROR => "AAC core initialization failed",
        sys::AACENC_ERROR_AACENC_ENCODE_ERROR => "encoding failed",
        sys::AACENC_ERROR_AACENC_ENCODE_EOF => "end of stream",
        _ => "unknown error",
    };
    Err(AacError::Encoder(format!("{}: {} (0x{:x})", call, reason, code)))
}

/// Owned encoder handle, closed on drop.
pub struct AacEncoder {
    ptr: sys::HANDLE_AACENCODER,
    channels: u16,
}

// The handle is owned exclusively by this value.
unsafe impl Send for AacEncoder {}

impl AacEncoder {
    /// Open and configure an AAC-LC encoder.
    ///
    /// `bit_rate` of `None` selects the highest VBR quality.
    pub fn new(sample_rate: u32, channels: u16, bit_rate: Option<u32>) -> Result<Self, AacError> {
        let mode = channel_mode(channels)?;

        let mut ptr: sys::HANDLE_AACENCODER = ptr::null_mut();
        check(unsafe { sys::aacEncOpen(&mut ptr, 0, channels as u32) }, "aacEncOpen")?;
        // From here on `Drop` closes the handle on every error path.
        let encoder = Self { ptr, channels };

        encoder.set_param(sys::AACENC_PARAM_AACENC_AOT, sys::AUDIO_OBJECT_TYPE_AOT_AAC_LC as u32)?;
        match bit_rate {
            Some(bps) => {
                encoder.set_param(sys::AACENC_PARAM_AACENC_BITRATEMODE, 0)?;
                encoder.set_param(sys::AACENC_PARAM_AACENC_BITRATE, bps)?;
            }
            None => encoder.set_param(sys::AACENC_PARAM_AACENC_BITRATEMODE, VBR_HIGH)?,
        }
        encoder.set_param(sys::AACENC_PARAM_AACENC_SAMPLERATE, sample_rate)?;
        encoder.set_param(sys::AACENC_PARAM_AACENC_CHANNELMODE, mode as u32)?;
        encoder.set_param(sys::AACENC_PARAM_AACENC_CHANNELORDER, CHANNEL_ORDER_WAV)?;
        encoder.set_param(sys::AACENC_PARAM_AACENC_TRANSMUX, 0)?;
        encoder.set_param(sys::AACENC_PARAM_AACENC_SBR_MODE, 0)?;

        // A call with no buffers applies the parameters.
        check(
            unsafe { sys::aacEncEncode(encoder.ptr, ptr::null(), ptr::null(), ptr::null(), ptr::null_mut()) },
            "aacEncEncode(init)",
        )?;
        Ok(encoder)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn set_param(&self, param: sys::AACENC_PARAM, value: u32) -> Result<(), AacError> {
        check(
            unsafe { sys::aacEncoder_SetParam(self.ptr, param, value) },
            "aacEncoder_SetParam",
        )
    }

    pub fn info(&self) -> Result<EncoderInfo, AacError> {
        let mut info = MaybeUninit::<sys::AACENC_InfoStruct>::uninit();
        check(unsafe { sys::aacEncInfo(self.ptr, info.as_mut_ptr()) }, "aacEncInfo")?;
        let info = unsafe { info.assume_init() };
        Ok(EncoderInfo {
            frame_length: info.frameLength as usize,
            delay: info.nDelay as usize,
            max_packet_bytes: info.maxOutBufBytes as usize,
        })
    }

    /// Feed interleaved samples and collect at most one access unit.
    pub fn encode(&mut self, input: &[i16], output: &mut [u8]) -> Result<EncodeInfo, AacError> {
        let input_len = input.len().min(i32::MAX as usize) as c_int;

        let mut in_ptr = input.as_ptr() as *mut i16;
        let mut in_ident = sys::AACENC_BufferIdentifier_IN_AUDIO_DATA as c_int;
        let mut in_size = input_len * mem::size_of::<i16>() as c_int;
        let mut in_el_size = mem::size_of::<i16>() as c_int;
        let in_desc = sys::AACENC_BufDesc {
            numBufs: 1,
            bufs: &mut in_ptr as *mut _ as *mut *mut c_void,
            bufferIdentifiers: &mut in_ident,
            bufSizes: &mut in_size,
            bufElSizes: &mut in_el_size,
        };

        let mut out_ptr = output.as_mut_ptr();
        let mut out_ident = sys::AACENC_BufferIdentifier_OUT_BITSTREAM_DATA as c_int;
        let mut out_size = output.len().min(i32::MAX as usize) as c_int;
        let mut out_el_size = mem::size_of::<u8>() as c_int;
        let out_desc = sys::AACENC_BufDesc {
            numBufs: 1,
            bufs: &mut out_ptr as *mut _ as *mut *mut c_void,
            bufferIdentifiers: &mut out_ident,
            bufSizes: &mut out_size,
            bufElSizes: &mut out_el_size,
        };

        let in_args = sys::AACENC_InArgs {
            numInSamples: input_len,
            numAncBytes: 0,
        };
        let mut out_args: sys::AACENC_OutArgs = unsafe { mem::zeroed() };

        check(
            unsafe { sys::aacEncEncode(self.ptr, &in_desc, &out_desc, &in_args, &mut out_args) },
            "aacEncEncode",
        )?;
        Ok(EncodeInfo {
            input_consumed: out_args.numInSamples as usize,
            output_size: out_args.numOutBytes as usize,
        })
    }
}

impl Drop for AacEncoder {
    fn drop(&mut self) {
        unsafe {
            sys::aacEncClose(&mut self.ptr);
        }
    }
}

impl std::fmt::Debug for AacEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AacEncoder")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
