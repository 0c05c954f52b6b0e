//! Master-volume control over a simple-mixer element.
//!
//! Levels are fractions in `[0, 1]`. Inputs outside that range are clamped,
//! and every operation reports the level read back from the hardware,
//! rounded to two decimals.

use crate::error::{HwError, PcmError};
use crate::hw::error_fmt::described;
use crate::hw::traits::MixerBackend;
use tracing::{debug, error};

fn trim_pct(pct: f32) -> f32 {
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 1.0) }
}

fn round_pct(pct: f32) -> f32 {
    (pct * 100.0).round() / 100.0
}

fn mixer_op<T>(op: &'static str, result: Result<T, HwError>) -> Result<T, PcmError> {
    result.map_err(|source| {
        error!("{}", described(&format!("Mixer {op} failed."), &source));
        PcmError::Mixer { op, source }
    })
}

#[derive(Debug)]
pub struct VolumeControl<M: MixerBackend> {
    mixer: M,
    muted_raw: Option<i64>,
}

impl<M: MixerBackend> VolumeControl<M> {
    pub fn new(mixer: M) -> Self {
        Self {
            mixer,
            muted_raw: None,
        }
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn is_muted(&self) -> bool {
        self.muted_raw.is_some()
    }

    fn range(&self) -> Result<(i64, i64), PcmError> {
        mixer_op("get volume range", self.mixer.volume_range())
    }

    fn raw_to_pct(raw: i64, (min, max): (i64, i64)) -> f32 {
        let span = max - min;
        if span <= 0 {
            return 0.0;
        }
        round_pct(raw as f32 / span as f32)
    }

    fn write_pct(&mut self, pct: f32) -> Result<(), PcmError> {
        let pct = trim_pct(pct);
        let (_, max) = self.range()?;
        let raw = (pct * max as f32) as i64;
        mixer_op("set volume", self.mixer.set_volume_all(raw))
    }

    /// Current level as a fraction of the element's range.
    pub fn level_pct(&self) -> Result<f32, PcmError> {
        let range = self.range()?;
        let raw = mixer_op("get volume", self.mixer.volume())?;
        Ok(Self::raw_to_pct(raw, range))
    }

    pub fn set_level_pct(&mut self, pct: f32) -> Result<f32, PcmError> {
        self.write_pct(pct)?;
        self.muted_raw = None;
        let level = self.level_pct()?;
        debug!("volume set to {level:.2}");
        Ok(level)
    }

    pub fn increase_by_pct(&mut self, pct: f32) -> Result<f32, PcmError> {
        let step = trim_pct(pct);
        let target = round_pct(trim_pct(self.level_pct()? + step));
        self.set_level_pct(target)
    }

    pub fn decrease_by_pct(&mut self, pct: f32) -> Result<f32, PcmError> {
        let step = trim_pct(pct);
        let target = round_pct(trim_pct(self.level_pct()? - step));
        self.set_level_pct(target)
    }

    /// Drops the level to zero, remembering what it was.
    pub fn mute(&mut self) -> Result<f32, PcmError> {
        if self.muted_raw.is_none() {
            let raw = mixer_op("get volume", self.mixer.volume())?;
            self.write_pct(0.0)?;
            self.muted_raw = Some(raw);
        }
        self.level_pct()
    }

    /// Restores the level saved by [`mute`](Self::mute). No-op when not muted.
    pub fn unmute(&mut self) -> Result<f32, PcmError> {
        if let Some(raw) = self.muted_raw {
            mixer_op("set volume", self.mixer.set_volume_all(raw))?;
            self.muted_raw = None;
        }
        self.level_pct()
    }
}
