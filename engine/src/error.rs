use crate::format::SampleFormat;
use crate::state::{Direction, PcmState};
use nix::errno::Errno;
use nix::libc;
use std::fmt;
use thiserror::Error;

pub const EAGAIN: i32 = libc::EAGAIN;
pub const EPIPE: i32 = libc::EPIPE;
#[cfg(target_os = "linux")]
pub const ESTRPIPE: i32 = libc::ESTRPIPE;
#[cfg(not(target_os = "linux"))]
pub const ESTRPIPE: i32 = 86;

/// Raw failure reported by the audio subsystem.
///
/// `code` follows the driver convention of a negated errno value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwError {
    pub code: i32,
    pub func: &'static str,
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.func, self.description())
    }
}

impl std::error::Error for HwError {}

impl HwError {
    pub fn new(func: &'static str, code: i32) -> Self {
        Self {
            code: -code.abs(),
            func,
        }
    }

    pub fn errno(&self) -> Errno {
        Errno::from_raw(-self.code)
    }

    pub fn description(&self) -> &'static str {
        self.errno().desc()
    }

    /// Device temporarily cannot accept or deliver data.
    pub fn is_again(&self) -> bool {
        self.code == -EAGAIN
    }

    pub fn cause(&self) -> FaultCause {
        match -self.code {
            EPIPE => FaultCause::Underrun,
            ESTRPIPE => FaultCause::Suspended,
            _ => FaultCause::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCause {
    /// Playback ran dry or capture overflowed.
    Underrun,
    Suspended,
    Other,
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Underrun => "underrun",
            Self::Suspended => "suspend",
            Self::Other => "unclassified fault",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    Initialize,
    Access,
    Format,
    Channels,
    Rate,
    PeriodTime,
    PeriodSize,
    Commit,
}

impl NegotiationStep {
    pub fn description(self) -> &'static str {
        match self {
            Self::Initialize => "Cannot allocate hardware parameter structure for PCM object",
            Self::Access => "Cannot set access type for PCM object",
            Self::Format => "Cannot set sample format for PCM object",
            Self::Channels => "Cannot set channel count for PCM object",
            Self::Rate => "Cannot set sample rate for PCM object",
            Self::PeriodTime => "Cannot set period time for PCM object",
            Self::PeriodSize => "Could not get period size for PCM object",
            Self::Commit => "Cannot apply hardware parameters to PCM device",
        }
    }
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("unrecoverable hardware error: {0}")]
    Unrecoverable(HwError),
    #[error("attempt to recover from {cause} failed: {source}")]
    Prepare { cause: FaultCause, source: HwError },
}

impl RecoveryError {
    pub fn hw_error(&self) -> HwError {
        match self {
            Self::Unrecoverable(err) => *err,
            Self::Prepare { source, .. } => *source,
        }
    }
}

#[derive(Debug, Error)]
pub enum PcmError {
    #[error("Cannot open handle to PCM device '{device}': {source}")]
    Open { device: String, source: HwError },

    #[error("Could not configure PCM device - device in state {state} instead of OPEN")]
    NotConfigurable { state: PcmState },

    #[error("{step}: {source}")]
    Negotiation {
        step: NegotiationStep,
        source: HwError,
    },

    #[error("PCM device not ready for transfer - device in state {state}")]
    NotReady { state: PcmState },

    #[error("Cannot {op} on a {direction} device")]
    WrongDirection {
        op: &'static str,
        direction: Direction,
    },

    #[error(
        "Argument type mismatch: buffer samples are {sample_bytes}-byte {signedness} but {format} needs {format_bytes}-byte {format_signedness}"
    )]
    SampleTypeMismatch {
        format: SampleFormat,
        format_bytes: usize,
        format_signedness: &'static str,
        sample_bytes: usize,
        signedness: &'static str,
    },

    #[error("Buffer of {samples} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { samples: usize, channels: usize },

    #[error("Transfer aborted after {transferred} frames: {source}")]
    Transfer {
        transferred: usize,
        source: RecoveryError,
    },

    #[error("Cannot open mixer for device '{device}': {source}")]
    MixerOpen { device: String, source: HwError },

    #[error("Could not find simple mixer element named {0}")]
    MixerElementNotFound(String),

    #[error("Mixer {op} failed: {source}")]
    Mixer { op: &'static str, source: HwError },
}

impl PcmError {
    /// Hardware error code behind this failure, if the hardware produced one.
    pub fn hw_error(&self) -> Option<HwError> {
        match self {
            Self::Open { source, .. }
            | Self::Negotiation { source, .. }
            | Self::MixerOpen { source, .. }
            | Self::Mixer { source, .. } => Some(*source),
            Self::Transfer { source, .. } => Some(source.hw_error()),
            Self::NotConfigurable { .. }
            | Self::NotReady { .. }
            | Self::WrongDirection { .. }
            | Self::SampleTypeMismatch { .. }
            | Self::PartialFrame { .. }
            | Self::MixerElementNotFound(_) => None,
        }
    }

    /// Frames moved before a mid-transfer abort.
    pub fn frames_transferred(&self) -> Option<usize> {
        match self {
            Self::Transfer { transferred, .. } => Some(*transferred),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errno() {
        assert_eq!(HwError::new("snd_pcm_writei", -EPIPE).cause(), FaultCause::Underrun);
        assert_eq!(HwError::new("snd_pcm_writei", -ESTRPIPE).cause(), FaultCause::Suspended);
        assert_eq!(HwError::new("snd_pcm_writei", -libc::EIO).cause(), FaultCause::Other);
        assert!(HwError::new("snd_pcm_writei", -EAGAIN).is_again());
        assert!(!HwError::new("snd_pcm_writei", -EPIPE).is_again());
    }

    #[test]
    fn code_is_always_negative() {
        let positive = HwError::new("snd_pcm_prepare", libc::EBADF);
        let negative = HwError::new("snd_pcm_prepare", -libc::EBADF);
        assert_eq!(positive, negative);
        assert_eq!(positive.code, -libc::EBADF);
    }

    #[test]
    fn transfer_error_reports_progress_and_code() {
        let err = PcmError::Transfer {
            transferred: 1764,
            source: RecoveryError::Unrecoverable(HwError::new("snd_pcm_writei", -libc::EIO)),
        };
        assert_eq!(err.frames_transferred(), Some(1764));
        assert_eq!(err.hw_error().map(|e| e.code), Some(-libc::EIO));
        assert!(err.to_string().starts_with("Transfer aborted after 1764 frames"));
    }

    #[test]
    fn not_configurable_names_state() {
        let err = PcmError::NotConfigurable {
            state: PcmState::Running,
        };
        assert!(err.to_string().contains("RUNNING"));
    }
}
