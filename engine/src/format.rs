use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    RwInterleaved,
}

/// Sample encodings a device may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    U8,
    S16Le,
    S24Le,
    S32Le,
}

impl SampleFormat {
    /// Bytes each sample occupies in the transfer buffer. S24 travels in a
    /// 32-bit container.
    pub fn physical_width_bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16Le => 2,
            Self::S24Le | Self::S32Le => 4,
        }
    }

    /// Significant bits per sample.
    pub fn bits(self) -> u16 {
        match self {
            Self::U8 => 8,
            Self::S16Le => 16,
            Self::S24Le => 24,
            Self::S32Le => 32,
        }
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, Self::U8)
    }

    /// WAV data is little-endian; up to 8 bits is unsigned, wider is signed.
    pub fn from_wav_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::S16Le),
            24 => Some(Self::S24Le),
            32 => Some(Self::S32Le),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::S16Le => "S16_LE",
            Self::S24Le => "S24_LE",
            Self::S32Le => "S32_LE",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum Channels {
    Mono = 1,
    Stereo = 2,
    StereoPlusSub = 3,
    StereoSurround = 4,
    FullSurround = 5,
    FullSurroundPlusSub = 6,
}

impl Channels {
    pub fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<u16> for Channels {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            3 => Ok(Self::StereoPlusSub),
            4 => Ok(Self::StereoSurround),
            5 => Ok(Self::FullSurround),
            6 => Ok(Self::FullSurroundPlusSub),
            other => Err(format!("unsupported channel count {other}, expected 1 to 6")),
        }
    }
}

impl From<Channels> for u16 {
    fn from(value: Channels) -> Self {
        value as u16
    }
}

/// Parameters requested from, or granted by, the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwParameters {
    #[serde(default)]
    pub access: Access,
    pub format: SampleFormat,
    pub rate_hz: u32,
    pub channels: Channels,
    pub period_time_us: u32,
}

impl HwParameters {
    pub fn new(format: SampleFormat, rate_hz: u32, channels: Channels, period_time_us: u32) -> Self {
        Self {
            access: Access::RwInterleaved,
            format,
            rate_hz,
            channels,
            period_time_us,
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.channels.count() * self.format.physical_width_bytes()
    }
}

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParams {
    pub params: HwParameters,
    /// Frames the hardware consumes per interrupt.
    pub period_size: usize,
    pub requested_rate_hz: u32,
}

impl NegotiatedParams {
    /// `(requested, granted)` when the hardware substituted another rate.
    pub fn rate_mismatch(&self) -> Option<(u32, u32)> {
        (self.requested_rate_hz != self.params.rate_hz)
            .then_some((self.requested_rate_hz, self.params.rate_hz))
    }

    pub fn frame_bytes(&self) -> usize {
        self.params.frame_bytes()
    }

    pub fn channels(&self) -> usize {
        self.params.channels.count()
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
}

/// Element type of an interleaved sample buffer.
pub trait Sample: sealed::Sealed + Copy + Default + Send + 'static {
    const WIDTH: usize;
    const SIGNED: bool;

    /// `dst.len()` must equal `src.len() * WIDTH`.
    fn encode_le(src: &[Self], dst: &mut [u8]);
    /// `src.len()` must equal `dst.len() * WIDTH`.
    fn decode_le(src: &[u8], dst: &mut [Self]);

    fn matches(format: SampleFormat) -> bool {
        Self::WIDTH == format.physical_width_bytes() && Self::SIGNED == format.is_signed()
    }
}

impl Sample for u8 {
    const WIDTH: usize = 1;
    const SIGNED: bool = false;

    fn encode_le(src: &[Self], dst: &mut [u8]) {
        dst.copy_from_slice(src);
    }

    fn decode_le(src: &[u8], dst: &mut [Self]) {
        dst.copy_from_slice(src);
    }
}

impl Sample for i16 {
    const WIDTH: usize = 2;
    const SIGNED: bool = true;

    fn encode_le(src: &[Self], dst: &mut [u8]) {
        LittleEndian::write_i16_into(src, dst);
    }

    fn decode_le(src: &[u8], dst: &mut [Self]) {
        LittleEndian::read_i16_into(src, dst);
    }
}

impl Sample for i32 {
    const WIDTH: usize = 4;
    const SIGNED: bool = true;

    fn encode_le(src: &[Self], dst: &mut [u8]) {
        LittleEndian::write_i32_into(src, dst);
    }

    fn decode_le(src: &[u8], dst: &mut [Self]) {
        LittleEndian::read_i32_into(src, dst);
    }
}

pub(crate) fn signedness(signed: bool) -> &'static str {
    if signed { "signed" } else { "unsigned" }
}
