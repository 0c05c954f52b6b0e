#![allow(dead_code)]

//! Scripted in-memory PCM used by the integration tests.
//!
//! Every hardware call is recorded. Transfer, prepare and resume replies can
//! be queued ahead of time; once a queue runs dry the call succeeds.

use nix::libc;
use pcmflow_engine::error::{EAGAIN, EPIPE, ESTRPIPE};
use pcmflow_engine::{
    Access, Channels, Direction, HwError, HwParameters, HwParamsContext, PcmBackend, PcmDevice,
    PcmState, RecoveryPolicy, SampleFormat,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    HwParamsAny,
    SetAccess,
    SetFormat(SampleFormat),
    SetChannels(u32),
    SetRateNear(u32),
    SetPeriodTimeNear(u32),
    PeriodSize,
    Commit,
    Prepare,
    Resume,
    Write(usize),
    Read(usize),
}

/// Reply to one `write_frames`/`read_frames` call.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Accept(usize),
    Fail(i32),
}

#[derive(Debug, Clone)]
pub struct Caps {
    pub formats: Vec<SampleFormat>,
    pub max_channels: u32,
    pub rates: Vec<u32>,
    pub period_time_us: Option<u32>,
    pub fail_commit: Option<i32>,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            formats: vec![
                SampleFormat::U8,
                SampleFormat::S16Le,
                SampleFormat::S24Le,
                SampleFormat::S32Le,
            ],
            max_channels: 6,
            rates: vec![8000, 22050, 44100, 48000, 96000],
            period_time_us: None,
            fail_commit: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Inner {
    pub state: Option<PcmState>,
    pub caps: Caps,
    pub calls: Vec<Call>,
    pub transfers: VecDeque<Reply>,
    pub prepares: VecDeque<i32>,
    pub resumes: VecDeque<i32>,
    pub frame_bytes: usize,
    pub written: Vec<u8>,
    pub capture_counter: u8,
    pub params_allocated: usize,
    pub params_released: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedPcm {
    inner: Rc<RefCell<Inner>>,
}

impl ScriptedPcm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(caps: Caps) -> Self {
        let pcm = Self::new();
        pcm.inner.borrow_mut().caps = caps;
        pcm
    }

    pub fn set_state(&self, state: PcmState) {
        self.inner.borrow_mut().state = Some(state);
    }

    pub fn queue_transfers(&self, replies: impl IntoIterator<Item = Reply>) {
        self.inner.borrow_mut().transfers.extend(replies);
    }

    /// Non-zero entries are returned as negated errno codes.
    pub fn queue_resumes(&self, codes: impl IntoIterator<Item = i32>) {
        self.inner.borrow_mut().resumes.extend(codes);
    }

    pub fn queue_prepares(&self, codes: impl IntoIterator<Item = i32>) {
        self.inner.borrow_mut().prepares.extend(codes);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn count(&self, call: Call) -> usize {
        self.inner.borrow().calls.iter().filter(|c| **c == call).count()
    }

    pub fn transfer_sizes(&self) -> Vec<usize> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(n) | Call::Read(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    pub fn params_balance(&self) -> (usize, usize) {
        let inner = self.inner.borrow();
        (inner.params_allocated, inner.params_released)
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn reply(&self, frames: usize) -> Result<usize, HwError> {
        let mut inner = self.inner.borrow_mut();
        match inner.transfers.pop_front() {
            None => {
                inner.state = Some(PcmState::Running);
                Ok(frames)
            }
            Some(Reply::Accept(n)) => {
                inner.state = Some(PcmState::Running);
                Ok(n.min(frames))
            }
            Some(Reply::Fail(code)) => {
                if code == EPIPE {
                    inner.state = Some(PcmState::XRun);
                } else if code == ESTRPIPE {
                    inner.state = Some(PcmState::Suspended);
                }
                Err(HwError::new("scripted_transfer", code))
            }
        }
    }
}

pub struct ScriptedParams<'a> {
    pcm: &'a ScriptedPcm,
    format: Option<SampleFormat>,
    channels: u32,
    rate_hz: u32,
    period_time_us: u32,
}

impl Drop for ScriptedParams<'_> {
    fn drop(&mut self) {
        self.pcm.inner.borrow_mut().params_released += 1;
    }
}

fn einval(func: &'static str) -> HwError {
    HwError::new(func, libc::EINVAL)
}

impl HwParamsContext for ScriptedParams<'_> {
    fn set_access(&mut self, _access: Access) -> Result<(), HwError> {
        self.pcm.record(Call::SetAccess);
        Ok(())
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), HwError> {
        self.pcm.record(Call::SetFormat(format));
        if !self.pcm.inner.borrow().caps.formats.contains(&format) {
            return Err(einval("snd_pcm_hw_params_set_format"));
        }
        self.format = Some(format);
        Ok(())
    }

    fn set_channels(&mut self, channels: u32) -> Result<(), HwError> {
        self.pcm.record(Call::SetChannels(channels));
        if channels > self.pcm.inner.borrow().caps.max_channels {
            return Err(einval("snd_pcm_hw_params_set_channels"));
        }
        self.channels = channels;
        Ok(())
    }

    fn set_rate_near(&mut self, rate_hz: u32) -> Result<u32, HwError> {
        self.pcm.record(Call::SetRateNear(rate_hz));
        let granted = self
            .pcm
            .inner
            .borrow()
            .caps
            .rates
            .iter()
            .copied()
            .min_by_key(|r| r.abs_diff(rate_hz))
            .ok_or_else(|| einval("snd_pcm_hw_params_set_rate_near"))?;
        self.rate_hz = granted;
        Ok(granted)
    }

    fn set_period_time_near(&mut self, period_time_us: u32) -> Result<u32, HwError> {
        self.pcm.record(Call::SetPeriodTimeNear(period_time_us));
        let granted = self
            .pcm
            .inner
            .borrow()
            .caps
            .period_time_us
            .unwrap_or(period_time_us);
        self.period_time_us = granted;
        Ok(granted)
    }

    fn period_size(&self) -> Result<usize, HwError> {
        self.pcm.record(Call::PeriodSize);
        Ok((u64::from(self.rate_hz) * u64::from(self.period_time_us) / 1_000_000) as usize)
    }
}

impl PcmBackend for ScriptedPcm {
    type Params<'a> = ScriptedParams<'a>;

    fn state(&self) -> PcmState {
        self.inner.borrow().state.unwrap_or(PcmState::Open)
    }

    fn hw_params_any(&self) -> Result<ScriptedParams<'_>, HwError> {
        self.record(Call::HwParamsAny);
        self.inner.borrow_mut().params_allocated += 1;
        Ok(ScriptedParams {
            pcm: self,
            format: None,
            channels: 0,
            rate_hz: 0,
            period_time_us: 0,
        })
    }

    fn commit(&self, params: &ScriptedParams<'_>) -> Result<(), HwError> {
        self.record(Call::Commit);
        let mut inner = self.inner.borrow_mut();
        if let Some(code) = inner.caps.fail_commit {
            return Err(HwError::new("snd_pcm_hw_params", code));
        }
        let width = params.format.map(|f| f.physical_width_bytes()).unwrap_or(1);
        inner.frame_bytes = width * params.channels as usize;
        inner.state = Some(PcmState::Prepared);
        Ok(())
    }

    fn prepare(&self) -> Result<(), HwError> {
        self.record(Call::Prepare);
        let mut inner = self.inner.borrow_mut();
        match inner.prepares.pop_front() {
            Some(code) if code != 0 => Err(HwError::new("snd_pcm_prepare", code)),
            _ => {
                inner.state = Some(PcmState::Prepared);
                Ok(())
            }
        }
    }

    fn resume(&self) -> Result<(), HwError> {
        self.record(Call::Resume);
        let mut inner = self.inner.borrow_mut();
        match inner.resumes.pop_front() {
            Some(code) if code != 0 => Err(HwError::new("snd_pcm_resume", code)),
            _ => {
                inner.state = Some(PcmState::Prepared);
                Ok(())
            }
        }
    }

    fn write_frames(&self, bytes: &[u8]) -> Result<usize, HwError> {
        let frame_bytes = self.inner.borrow().frame_bytes.max(1);
        let frames = bytes.len() / frame_bytes;
        self.record(Call::Write(frames));
        let accepted = self.reply(frames)?;
        self.inner
            .borrow_mut()
            .written
            .extend_from_slice(&bytes[..accepted * frame_bytes]);
        Ok(accepted)
    }

    fn read_frames(&self, bytes: &mut [u8]) -> Result<usize, HwError> {
        let frame_bytes = self.inner.borrow().frame_bytes.max(1);
        let frames = bytes.len() / frame_bytes;
        self.record(Call::Read(frames));
        let produced = self.reply(frames)?;
        let mut inner = self.inner.borrow_mut();
        for byte in &mut bytes[..produced * frame_bytes] {
            *byte = inner.capture_counter;
            inner.capture_counter = inner.capture_counter.wrapping_add(1);
        }
        Ok(produced)
    }
}

pub fn fast_policy() -> RecoveryPolicy {
    RecoveryPolicy {
        resume_backoff: Duration::ZERO,
        max_resume_attempts: None,
    }
}

pub fn cd_params() -> HwParameters {
    HwParameters::new(SampleFormat::S16Le, 44100, Channels::Stereo, 20000)
}

/// Playback device already negotiated to 44.1 kHz stereo S16 with 882-frame
/// periods. The returned handle shares state with the device's backend.
pub fn configured_playback() -> (PcmDevice<ScriptedPcm>, ScriptedPcm) {
    configured(Direction::Playback, cd_params())
}

pub fn configured(
    direction: Direction,
    params: HwParameters,
) -> (PcmDevice<ScriptedPcm>, ScriptedPcm) {
    let pcm = ScriptedPcm::new();
    let mut device = PcmDevice::from_backend("scripted", direction, pcm.clone());
    device.set_recovery_policy(fast_policy());
    device.configure(params).expect("scripted negotiation");
    pcm.clear_calls();
    (device, pcm)
}

pub const AGAIN: i32 = EAGAIN;
pub const UNDERRUN: i32 = EPIPE;
pub const SUSPENDED: i32 = ESTRPIPE;
