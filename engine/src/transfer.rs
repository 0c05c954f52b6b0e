use crate::device::PcmDevice;
use crate::error::{HwError, PcmError};
use crate::format::{NegotiatedParams, Sample, signedness};
use crate::hw::traits::PcmBackend;
use crate::recovery::{self, RecoveryPolicy};
use crate::state::Direction;
use tracing::{debug, warn};

/// A contiguous run of frames handed to the hardware as one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSpan {
    pub index: usize,
    /// First frame of the span within the whole buffer.
    pub start: usize,
    pub frames: usize,
}

/// Splits `total_frames` into period-sized spans.
#[derive(Debug, Clone)]
pub struct Periods {
    total_frames: usize,
    period_size: usize,
    next_start: usize,
    index: usize,
}

/// Every span holds `period_size` frames except possibly the last, which
/// holds the remainder. No empty span is ever produced.
pub fn periods(total_frames: usize, period_size: usize) -> Periods {
    Periods {
        total_frames,
        period_size: period_size.max(1),
        next_start: 0,
        index: 0,
    }
}

/// Number of spans [`periods`] yields, `ceil(total_frames / period_size)`.
pub fn period_count(total_frames: usize, period_size: usize) -> usize {
    total_frames.div_ceil(period_size.max(1))
}

impl Iterator for Periods {
    type Item = PeriodSpan;

    fn next(&mut self) -> Option<PeriodSpan> {
        if self.next_start >= self.total_frames {
            return None;
        }
        let frames = (self.total_frames - self.next_start).min(self.period_size);
        let span = PeriodSpan {
            index: self.index,
            start: self.next_start,
            frames,
        };
        self.next_start += frames;
        self.index += 1;
        Some(span)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total_frames - self.next_start.min(self.total_frames))
            .div_ceil(self.period_size);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Periods {}

/// What happened to one period.
enum PeriodOutcome {
    Complete,
    /// A recovered fault cut the period short; the rest was dropped.
    Truncated { dropped: usize },
}

/// Moves one period through `op` until it is consumed or faulted.
///
/// `op` gets the byte offset into the period and returns frames moved.
fn run_period<B: PcmBackend>(
    backend: &B,
    policy: &RecoveryPolicy,
    span: PeriodSpan,
    frame_bytes: usize,
    transferred: &mut usize,
    mut op: impl FnMut(&B, usize) -> Result<usize, HwError>,
) -> Result<PeriodOutcome, PcmError> {
    let mut done = 0_usize;
    while done < span.frames {
        match op(backend, done * frame_bytes) {
            Ok(0) => continue,
            Ok(frames) => {
                let frames = frames.min(span.frames - done);
                done += frames;
                *transferred += frames;
            }
            Err(err) if err.is_again() => continue,
            Err(err) => match recovery::recover(backend, err, policy) {
                Ok(recovery) => {
                    let dropped = span.frames - done;
                    warn!(
                        "period {} cut short by {:?}: {} of {} frames dropped",
                        span.index, recovery, dropped, span.frames
                    );
                    return Ok(PeriodOutcome::Truncated { dropped });
                }
                Err(source) => {
                    return Err(PcmError::Transfer {
                        transferred: *transferred,
                        source,
                    });
                }
            },
        }
    }
    Ok(PeriodOutcome::Complete)
}

impl<B: PcmBackend> PcmDevice<B> {
    /// Checks everything that can be checked without touching the hardware
    /// and returns the negotiated parameters plus the frame count.
    fn check_transfer<T: Sample>(
        &self,
        op: &'static str,
        want: Direction,
        samples: usize,
    ) -> Result<(NegotiatedParams, usize), PcmError> {
        if self.direction() != want {
            return Err(PcmError::WrongDirection {
                op,
                direction: self.direction(),
            });
        }
        let Some(negotiated) = self.negotiated else {
            return Err(PcmError::NotReady {
                state: self.state(),
            });
        };
        let format = negotiated.params.format;
        if !T::matches(format) {
            return Err(PcmError::SampleTypeMismatch {
                format,
                format_bytes: format.physical_width_bytes(),
                format_signedness: signedness(format.is_signed()),
                sample_bytes: T::WIDTH,
                signedness: signedness(T::SIGNED),
            });
        }
        let channels = negotiated.channels();
        if samples % channels != 0 {
            return Err(PcmError::PartialFrame { samples, channels });
        }
        let state = self.state();
        if !state.is_transferable() {
            return Err(PcmError::NotReady { state });
        }
        Ok((negotiated, samples / channels))
    }

    /// Plays interleaved `samples`, one period at a time.
    ///
    /// Returns the frames the hardware accepted. An underrun or suspend is
    /// recovered in place and costs the unwritten rest of the current period;
    /// any other fault aborts with [`PcmError::Transfer`].
    pub fn write<T: Sample>(&mut self, samples: &[T]) -> Result<usize, PcmError> {
        let (negotiated, total_frames) =
            self.check_transfer::<T>("write", Direction::Playback, samples.len())?;
        let Some(backend) = self.backend.as_ref() else {
            return Err(PcmError::NotReady {
                state: self.state(),
            });
        };
        let channels = negotiated.channels();
        let frame_bytes = negotiated.frame_bytes();
        let policy = self.recovery;
        let scratch = &mut self.scratch;

        let mut transferred = 0_usize;
        let mut dropped = 0_usize;
        for span in periods(total_frames, negotiated.period_size) {
            let src = &samples[span.start * channels..(span.start + span.frames) * channels];
            scratch.resize(span.frames * frame_bytes, 0);
            T::encode_le(src, scratch);
            let bytes = &scratch[..];
            let outcome = run_period(
                backend,
                &policy,
                span,
                frame_bytes,
                &mut transferred,
                |pcm, offset| pcm.write_frames(&bytes[offset..]),
            )?;
            if let PeriodOutcome::Truncated { dropped: n } = outcome {
                dropped += n;
            }
        }
        debug!("wrote {transferred} of {total_frames} frames ({dropped} dropped)");
        Ok(transferred)
    }

    /// Fills interleaved `samples` from a capture device, one period at a
    /// time. Frames lost to a recovered overrun are left untouched.
    pub fn read<T: Sample>(&mut self, samples: &mut [T]) -> Result<usize, PcmError> {
        let (negotiated, total_frames) =
            self.check_transfer::<T>("read", Direction::Capture, samples.len())?;
        let Some(backend) = self.backend.as_ref() else {
            return Err(PcmError::NotReady {
                state: self.state(),
            });
        };
        let channels = negotiated.channels();
        let frame_bytes = negotiated.frame_bytes();
        let policy = self.recovery;
        let scratch = &mut self.scratch;

        let mut transferred = 0_usize;
        let mut dropped = 0_usize;
        for span in periods(total_frames, negotiated.period_size) {
            scratch.resize(span.frames * frame_bytes, 0);
            let before = transferred;
            let bytes = &mut scratch[..];
            let outcome = run_period(
                backend,
                &policy,
                span,
                frame_bytes,
                &mut transferred,
                |pcm, offset| pcm.read_frames(&mut bytes[offset..]),
            );
            let got = transferred - before;
            let dst = &mut samples[span.start * channels..(span.start + got) * channels];
            T::decode_le(&scratch[..got * frame_bytes], dst);
            if let PeriodOutcome::Truncated { dropped: n } = outcome? {
                dropped += n;
            }
        }
        debug!("read {transferred} of {total_frames} frames ({dropped} dropped)");
        Ok(transferred)
    }
}
