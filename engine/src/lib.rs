pub mod device;
pub mod error;
pub mod format;
pub mod hw;
pub mod mixer;
mod negotiate;
pub mod recovery;
pub mod state;
pub mod transfer;

pub use device::PcmDevice;
pub use error::{FaultCause, HwError, NegotiationStep, PcmError, RecoveryError};
pub use format::{Access, Channels, HwParameters, NegotiatedParams, Sample, SampleFormat};
pub use hw::traits::{HwParamsContext, MixerBackend, PcmBackend};
pub use mixer::VolumeControl;
pub use recovery::{Recovery, RecoveryPolicy};
pub use state::{Direction, PcmState};
pub use transfer::{PeriodSpan, Periods, period_count, periods};

#[cfg(target_os = "linux")]
pub use hw::alsa::{AlsaDevice, AlsaMixer, AlsaPcm};
