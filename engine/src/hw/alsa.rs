use super::config;
use super::error_fmt;
use super::traits::{HwParamsContext, MixerBackend, PcmBackend};
use crate::device::PcmDevice;
use crate::error::{HwError, PcmError};
use crate::format::{Access, SampleFormat};
use crate::recovery::RecoveryPolicy;
use crate::state::{Direction, PcmState};
use alsa::ValueOr;
use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};
use alsa::pcm::{self, Format, HwParams, PCM, State};
use nix::libc;
use tracing::{debug, error};

pub type AlsaDevice = PcmDevice<AlsaPcm>;

fn hw_error(err: alsa::Error) -> HwError {
    HwError::new(err.func(), err.errno())
}

fn alsa_format(format: SampleFormat) -> Format {
    match format {
        SampleFormat::U8 => Format::U8,
        SampleFormat::S16Le => Format::S16LE,
        SampleFormat::S24Le => Format::S24LE,
        SampleFormat::S32Le => Format::S32LE,
    }
}

fn alsa_access(access: Access) -> pcm::Access {
    match access {
        Access::RwInterleaved => pcm::Access::RWInterleaved,
    }
}

fn alsa_direction(direction: Direction) -> alsa::Direction {
    match direction {
        Direction::Playback => alsa::Direction::Playback,
        Direction::Capture => alsa::Direction::Capture,
    }
}

fn pcm_state(state: State) -> PcmState {
    match state {
        State::Open | State::Setup => PcmState::Open,
        State::Prepared => PcmState::Prepared,
        State::Running | State::Draining | State::Paused => PcmState::Running,
        State::XRun => PcmState::XRun,
        State::Suspended => PcmState::Suspended,
        State::Disconnected => PcmState::Closed,
    }
}

pub struct AlsaPcm {
    pcm: PCM,
}

impl std::fmt::Debug for AlsaPcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlsaPcm")
            .field("state", &pcm_state(self.pcm.state()))
            .finish()
    }
}

impl AlsaPcm {
    pub fn open(name: &str, direction: Direction, nonblock: bool) -> Result<Self, HwError> {
        let pcm = PCM::new(name, alsa_direction(direction), nonblock).map_err(hw_error)?;
        Ok(Self { pcm })
    }
}

impl PcmDevice<AlsaPcm> {
    /// Opens `name` (e.g. "default") with the recovery policy taken from the
    /// environment. `PCMFLOW_NONBLOCK` selects non-blocking transfers.
    pub fn open(name: &str, direction: Direction) -> Result<Self, PcmError> {
        let nonblock = config::env_flag(config::NONBLOCK_ENV);
        let backend = AlsaPcm::open(name, direction, nonblock).map_err(|source| {
            error!(
                "{}",
                error_fmt::backend_open_error(direction.label(), name, source)
            );
            PcmError::Open {
                device: name.to_string(),
                source,
            }
        })?;
        debug!("opened ALSA {direction} '{name}' (nonblock={nonblock})");
        let mut device = PcmDevice::from_backend(name, direction, backend);
        device.set_recovery_policy(RecoveryPolicy::from_env());
        Ok(device)
    }
}

pub struct AlsaParams<'a> {
    hwp: HwParams<'a>,
}

impl HwParamsContext for AlsaParams<'_> {
    fn set_access(&mut self, access: Access) -> Result<(), HwError> {
        self.hwp.set_access(alsa_access(access)).map_err(hw_error)
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), HwError> {
        self.hwp.set_format(alsa_format(format)).map_err(hw_error)
    }

    fn set_channels(&mut self, channels: u32) -> Result<(), HwError> {
        self.hwp.set_channels(channels).map_err(hw_error)
    }

    fn set_rate_near(&mut self, rate_hz: u32) -> Result<u32, HwError> {
        self.hwp
            .set_rate_near(rate_hz, ValueOr::Nearest)
            .map_err(hw_error)
    }

    fn set_period_time_near(&mut self, period_time_us: u32) -> Result<u32, HwError> {
        self.hwp
            .set_period_time_near(period_time_us, ValueOr::Nearest)
            .map_err(hw_error)
    }

    fn period_size(&self) -> Result<usize, HwError> {
        let frames = self.hwp.get_period_size().map_err(hw_error)?;
        usize::try_from(frames)
            .map_err(|_| HwError::new("snd_pcm_hw_params_get_period_size", libc::EINVAL))
    }
}

impl PcmBackend for AlsaPcm {
    type Params<'a> = AlsaParams<'a>;

    fn state(&self) -> PcmState {
        pcm_state(self.pcm.state())
    }

    fn hw_params_any(&self) -> Result<AlsaParams<'_>, HwError> {
        let hwp = HwParams::any(&self.pcm).map_err(hw_error)?;
        Ok(AlsaParams { hwp })
    }

    fn commit(&self, params: &AlsaParams<'_>) -> Result<(), HwError> {
        self.pcm.hw_params(&params.hwp).map_err(hw_error)
    }

    fn prepare(&self) -> Result<(), HwError> {
        self.pcm.prepare().map_err(hw_error)
    }

    fn resume(&self) -> Result<(), HwError> {
        self.pcm.resume().map_err(hw_error)
    }

    fn write_frames(&self, bytes: &[u8]) -> Result<usize, HwError> {
        self.pcm.io_bytes().writei(bytes).map_err(hw_error)
    }

    fn read_frames(&self, bytes: &mut [u8]) -> Result<usize, HwError> {
        self.pcm.io_bytes().readi(bytes).map_err(hw_error)
    }
}

/// Playback volume of one simple-mixer element, e.g. "Master" on "default".
pub struct AlsaMixer {
    mixer: Mixer,
    element: String,
}

impl std::fmt::Debug for AlsaMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlsaMixer")
            .field("element", &self.element)
            .finish()
    }
}

impl AlsaMixer {
    pub fn open(device: &str, element: &str) -> Result<Self, PcmError> {
        let mixer = Mixer::new(device, false).map_err(|e| {
            let source = hw_error(e);
            error!(
                "{}",
                error_fmt::described("Cannot open handle to mixer device.", &source)
            );
            PcmError::MixerOpen {
                device: device.to_string(),
                source,
            }
        })?;
        let found = mixer.find_selem(&SelemId::new(element, 0)).is_some();
        if !found {
            return Err(PcmError::MixerElementNotFound(element.to_string()));
        }
        Ok(Self {
            mixer,
            element: element.to_string(),
        })
    }

    fn selem(&self) -> Result<Selem<'_>, HwError> {
        self.mixer
            .find_selem(&SelemId::new(&self.element, 0))
            .ok_or_else(|| HwError::new("snd_mixer_find_selem", libc::ENOENT))
    }
}

impl MixerBackend for AlsaMixer {
    fn volume_range(&self) -> Result<(i64, i64), HwError> {
        Ok(self.selem()?.get_playback_volume_range())
    }

    fn volume(&self) -> Result<i64, HwError> {
        self.selem()?
            .get_playback_volume(SelemChannelId::mono())
            .map_err(hw_error)
    }

    fn set_volume_all(&mut self, raw: i64) -> Result<(), HwError> {
        self.selem()?.set_playback_volume_all(raw).map_err(hw_error)
    }
}
