//! WAV capture command.

use crate::config::Config;
use crate::wav::{self, Samples, WavClip};
use anyhow::{Context, ensure};
use clap::Args;
use pcmflow_engine::{AlsaDevice, Channels, Direction, HwParameters, SampleFormat};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct RecordArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Duration in seconds
    #[arg(short, long, default_value = "5.0")]
    seconds: f32,

    /// PCM device name
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    rate: Option<u32>,

    /// Channel count (1 to 6)
    #[arg(long, value_parser = parse_channels)]
    channels: Option<Channels>,

    /// Sample format: u8, s16_le, s24_le or s32_le
    #[arg(long, value_parser = parse_format)]
    format: Option<SampleFormat>,
}

fn parse_channels(s: &str) -> Result<Channels, String> {
    let n: u16 = s.parse().map_err(|e| format!("{e}"))?;
    Channels::try_from(n)
}

fn parse_format(s: &str) -> Result<SampleFormat, String> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "u8" => Ok(SampleFormat::U8),
        "s16_le" | "s16" => Ok(SampleFormat::S16Le),
        "s24_le" | "s24" => Ok(SampleFormat::S24Le),
        "s32_le" | "s32" => Ok(SampleFormat::S32Le),
        other => Err(format!("unsupported sample format '{other}'")),
    }
}

pub fn run(args: RecordArgs, config: &Config) -> anyhow::Result<()> {
    ensure!(
        args.seconds.is_finite() && args.seconds > 0.0,
        "--seconds must be positive"
    );
    let defaults = config.capture;
    let device_name = args.device.as_deref().unwrap_or(&config.device);
    let requested = HwParameters::new(
        args.format.unwrap_or(defaults.format),
        args.rate.unwrap_or(defaults.rate_hz),
        args.channels.unwrap_or(defaults.channels),
        defaults.period_time_us,
    );

    let mut device = AlsaDevice::open(device_name, Direction::Capture)?;
    device.set_recovery_policy(config.recovery.policy());
    let negotiated = device
        .configure(requested)
        .with_context(|| format!("failed to configure '{device_name}'"))?;
    let params = negotiated.params;
    if let Some((asked, got)) = negotiated.rate_mismatch() {
        warn!("capturing at {got} Hz instead of {asked} Hz");
    }

    let frames = (params.rate_hz as f32 * args.seconds) as usize;
    let len = frames * params.channels.count();
    info!("recording {frames} frames from '{device_name}'");

    let (samples, captured) = match params.format {
        SampleFormat::U8 => {
            let mut buf = vec![0_u8; len];
            let n = device.read(&mut buf).context("capture aborted")?;
            (Samples::U8(buf), n)
        }
        SampleFormat::S16Le => {
            let mut buf = vec![0_i16; len];
            let n = device.read(&mut buf).context("capture aborted")?;
            (Samples::S16(buf), n)
        }
        SampleFormat::S24Le | SampleFormat::S32Le => {
            let mut buf = vec![0_i32; len];
            let n = device.read(&mut buf).context("capture aborted")?;
            (Samples::S32(buf), n)
        }
    };
    device.close();

    let clip = WavClip {
        format: params.format,
        rate_hz: params.rate_hz,
        channels: params.channels,
        samples,
    };
    wav::write_wav(&args.output, &clip)?;

    if captured < frames {
        println!(
            "Recorded {captured} of {frames} frames to {} ({} lost to overruns).",
            args.output.display(),
            frames - captured
        );
    } else {
        println!("Recorded {frames} frames to {}.", args.output.display());
    }
    Ok(())
}
