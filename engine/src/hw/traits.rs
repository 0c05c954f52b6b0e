use crate::error::HwError;
use crate::format::{Access, SampleFormat};
use crate::state::PcmState;

/// A capability space being narrowed down before it is committed to a device.
///
/// Dropping the context releases it.
pub trait HwParamsContext {
    fn set_access(&mut self, access: Access) -> Result<(), HwError>;
    fn set_format(&mut self, format: SampleFormat) -> Result<(), HwError>;
    fn set_channels(&mut self, channels: u32) -> Result<(), HwError>;
    /// Returns the rate the hardware picked.
    fn set_rate_near(&mut self, rate_hz: u32) -> Result<u32, HwError>;
    /// Returns the period time the hardware picked.
    fn set_period_time_near(&mut self, period_time_us: u32) -> Result<u32, HwError>;
    fn period_size(&self) -> Result<usize, HwError>;
}

/// One open PCM endpoint.
///
/// Transfer methods move whole frames; byte slices are always a multiple of
/// the negotiated frame size and the return value counts frames.
pub trait PcmBackend {
    type Params<'a>: HwParamsContext
    where
        Self: 'a;

    fn state(&self) -> PcmState;
    /// Allocates a context initialised to the full capability set.
    fn hw_params_any(&self) -> Result<Self::Params<'_>, HwError>;
    /// Installs the constrained context and leaves the device PREPARED.
    fn commit(&self, params: &Self::Params<'_>) -> Result<(), HwError>;
    fn prepare(&self) -> Result<(), HwError>;
    fn resume(&self) -> Result<(), HwError>;
    fn write_frames(&self, bytes: &[u8]) -> Result<usize, HwError>;
    fn read_frames(&self, bytes: &mut [u8]) -> Result<usize, HwError>;
}

/// Playback volume of a single simple-mixer element.
pub trait MixerBackend {
    fn volume_range(&self) -> Result<(i64, i64), HwError>;
    fn volume(&self) -> Result<i64, HwError>;
    fn set_volume_all(&mut self, raw: i64) -> Result<(), HwError>;
}
