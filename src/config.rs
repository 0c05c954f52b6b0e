use anyhow::Context;
use pcmflow_engine::{Channels, RecoveryPolicy, SampleFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DEVICE: &str = "default";
pub const DEFAULT_MIXER_ELEMENT: &str = "Master";
pub const DEFAULT_BUFFER_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: String,
    /// Bytes handed to the engine per write while playing a file.
    pub buffer_bytes: usize,
    pub mixer: MixerConfig,
    pub capture: CaptureConfig,
    pub recovery: RecoveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            mixer: MixerConfig::default(),
            capture: CaptureConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MixerConfig {
    pub device: String,
    pub element: String,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            element: DEFAULT_MIXER_ELEMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub format: SampleFormat,
    pub rate_hz: u32,
    pub channels: Channels,
    pub period_time_us: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: SampleFormat::S16Le,
            rate_hz: 44100,
            channels: Channels::Stereo,
            period_time_us: 20000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoveryConfig {
    pub resume_backoff_ms: Option<u64>,
    pub max_resume_attempts: Option<u32>,
}

impl RecoveryConfig {
    /// File values over the built-in defaults, environment over both.
    pub fn policy(&self) -> RecoveryPolicy {
        let mut policy = RecoveryPolicy::default();
        if let Some(ms) = self.resume_backoff_ms {
            policy.resume_backoff = Duration::from_millis(ms);
        }
        if self.max_resume_attempts.is_some() {
            policy.max_resume_attempts = self.max_resume_attempts;
        }
        policy.with_env()
    }
}

impl Config {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(config.buffer_bytes > 0, "buffer_bytes must be positive");
        Ok(config)
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}
