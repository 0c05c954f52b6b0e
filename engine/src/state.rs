use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Playback,
    Capture,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Playback => "playback",
            Self::Capture => "capture",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operational state of a PCM handle.
///
/// Backends fold their native state codes into this set; every caller matches
/// exhaustively, so there is no "unknown state" path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmState {
    Open,
    Prepared,
    Running,
    XRun,
    Suspended,
    Closed,
}

impl PcmState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Prepared => "PREPARED",
            Self::Running => "RUNNING",
            Self::XRun => "XRUN",
            Self::Suspended => "SUSPENDED",
            Self::Closed => "CLOSED",
        }
    }

    pub fn is_configurable(self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_transferable(self) -> bool {
        match self {
            Self::Prepared | Self::Running => true,
            Self::Open | Self::XRun | Self::Suspended | Self::Closed => false,
        }
    }
}

impl fmt::Display for PcmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
