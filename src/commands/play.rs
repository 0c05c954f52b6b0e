//! WAV playback command.

use crate::config::Config;
use crate::wav::{self, Samples, WavClip};
use anyhow::{Context, ensure};
use clap::Args;
use pcmflow_engine::{
    AlsaDevice, Direction, HwParameters, PcmBackend, PcmDevice, PcmError, Sample,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// PCM device name
    #[arg(short, long)]
    device: Option<String>,

    /// Bytes handed to the device per write
    #[arg(long)]
    buffer_bytes: Option<usize>,
}

/// Samples per write: `buffer_bytes` worth, rounded down to whole frames.
pub fn chunk_samples(buffer_bytes: usize, bytes_per_sample: usize, channels: usize) -> usize {
    let samples = buffer_bytes / bytes_per_sample.max(1);
    let channels = channels.max(1);
    (samples - samples % channels).max(channels)
}

fn stream<B: PcmBackend, T: Sample>(
    device: &mut PcmDevice<B>,
    samples: &[T],
    chunk: usize,
) -> Result<usize, PcmError> {
    let mut played = 0;
    for block in samples.chunks(chunk) {
        played += device.write(block)?;
    }
    Ok(played)
}

pub fn run(args: PlayArgs, config: &Config) -> anyhow::Result<()> {
    let clip: WavClip = wav::read_wav(&args.input)?;
    ensure!(!clip.samples.is_empty(), "{} holds no audio", args.input.display());
    let device_name = args.device.as_deref().unwrap_or(&config.device);
    let buffer_bytes = args.buffer_bytes.unwrap_or(config.buffer_bytes).max(1);

    println!(
        "Playing {}: {} Hz, {} channel(s), {} ({} frames)",
        args.input.display(),
        clip.rate_hz,
        clip.channels.count(),
        clip.format,
        clip.frames()
    );

    let period_time_us =
        wav::period_time_us(clip.bytes_per_sec(), clip.format.bits(), buffer_bytes);
    let requested = HwParameters::new(clip.format, clip.rate_hz, clip.channels, period_time_us);

    let mut device = AlsaDevice::open(device_name, Direction::Playback)?;
    device.set_recovery_policy(config.recovery.policy());
    let negotiated = device
        .configure(requested)
        .with_context(|| format!("failed to configure '{device_name}'"))?;
    if let Some((asked, got)) = negotiated.rate_mismatch() {
        warn!("device plays at {got} Hz instead of {asked} Hz; pitch will shift");
    }
    info!(
        "period {} frames ({} us)",
        negotiated.period_size, negotiated.params.period_time_us
    );

    let chunk = chunk_samples(
        buffer_bytes,
        clip.format.physical_width_bytes(),
        clip.channels.count(),
    );
    let played = match &clip.samples {
        Samples::U8(s) => stream(&mut device, s, chunk),
        Samples::S16(s) => stream(&mut device, s, chunk),
        Samples::S32(s) => stream(&mut device, s, chunk),
    }
    .context("playback aborted")?;
    device.close();

    let total = clip.frames();
    if played < total {
        println!(
            "Done! {played} of {total} frames played, {} lost to xruns.",
            total - played
        );
    } else {
        println!("Done! {played} frames played.");
    }
    Ok(())
}
