//! WAV container handling on top of `hound`.
//!
//! Only integer PCM is accepted. 8-bit data is unsigned on the wire, wider
//! data is signed; 24- and 32-bit samples both travel as `i32`.

use anyhow::{Context, bail};
use pcmflow_engine::{Channels, SampleFormat};
use std::path::Path;

/// Interleaved samples in the width the device will be negotiated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    U8(Vec<u8>),
    S16(Vec<i16>),
    S32(Vec<i32>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::S16(s) => s.len(),
            Self::S32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavClip {
    pub format: SampleFormat,
    pub rate_hz: u32,
    pub channels: Channels,
    pub samples: Samples,
}

impl WavClip {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.count()
    }

    /// Bytes per second of the stored (packed) stream.
    pub fn bytes_per_sec(&self) -> u32 {
        self.rate_hz * u32::from(u16::from(self.channels)) * u32::from(self.format.bits() / 8)
    }
}

fn collect<T, R>(reader: hound::WavReader<R>) -> anyhow::Result<Vec<T>>
where
    T: hound::Sample,
    R: std::io::Read,
{
    reader
        .into_samples::<T>()
        .collect::<Result<Vec<T>, _>>()
        .context("failed to decode WAV samples")
}

pub fn read_wav(path: &Path) -> anyhow::Result<WavClip> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int {
        bail!("{} is not integer PCM audio", path.display());
    }
    let Some(format) = SampleFormat::from_wav_bits(spec.bits_per_sample) else {
        bail!(
            "the number of bits per sample in {} is non-standard ({})",
            path.display(),
            spec.bits_per_sample
        );
    };
    let channels = Channels::try_from(spec.channels).map_err(anyhow::Error::msg)?;

    let samples = match format {
        SampleFormat::U8 => Samples::U8(
            collect::<i8, _>(reader)?
                .into_iter()
                .map(|s| (i16::from(s) + 128) as u8)
                .collect(),
        ),
        SampleFormat::S16Le => Samples::S16(collect(reader)?),
        SampleFormat::S24Le | SampleFormat::S32Le => Samples::S32(collect(reader)?),
    };

    Ok(WavClip {
        format,
        rate_hz: spec.sample_rate,
        channels,
        samples,
    })
}

pub fn write_wav(path: &Path, clip: &WavClip) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: u16::from(clip.channels),
        sample_rate: clip.rate_hz,
        bits_per_sample: clip.format.bits(),
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file {}", path.display()))?;
    match &clip.samples {
        Samples::U8(samples) => {
            for &s in samples {
                writer.write_sample((i16::from(s) - 128) as i8)?;
            }
        }
        Samples::S16(samples) => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
        Samples::S32(samples) => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
    }
    writer.finalize().context("failed to finish WAV file")?;
    Ok(())
}

/// Period time that makes one hardware period match one `buffer_bytes`
/// chunk of the source stream.
pub fn period_time_us(bytes_per_sec: u32, bits_per_sample: u16, buffer_bytes: usize) -> u32 {
    let bytes_per_sample = usize::from(bits_per_sample / 8).max(1);
    let samples_per_buffer = (buffer_bytes / bytes_per_sample).max(1);
    let periods_per_sec = bytes_per_sec as usize / samples_per_buffer;
    if periods_per_sec == 0 {
        return 1_000_000;
    }
    (1_000_000.0 / periods_per_sec as f64) as u32
}
