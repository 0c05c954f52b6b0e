use crate::device::PcmDevice;
use crate::error::{HwError, NegotiationStep, PcmError};
use crate::format::{HwParameters, NegotiatedParams};
use crate::hw::error_fmt::described;
use crate::hw::traits::{HwParamsContext, PcmBackend};
use tracing::{debug, error, warn};

fn step<T>(step: NegotiationStep, result: Result<T, HwError>) -> Result<T, PcmError> {
    result.map_err(|source| {
        error!("{}", described(step.description(), &source));
        PcmError::Negotiation { step, source }
    })
}

impl<B: PcmBackend> PcmDevice<B> {
    /// Negotiates `requested` with the hardware and commits the result.
    ///
    /// Constraints are applied in a fixed order: access, format, channels,
    /// rate, period time. Rate and period time accept the nearest supported
    /// value; the granted rate replaces the requested one. On any failure the
    /// device stays OPEN.
    pub fn configure(&mut self, requested: HwParameters) -> Result<NegotiatedParams, PcmError> {
        let state = self.state();
        let backend = match &self.backend {
            Some(backend) if state.is_configurable() => backend,
            _ => {
                error!("Could not configure PCM device '{}' in state {state}", self.name());
                return Err(PcmError::NotConfigurable { state });
            }
        };

        let mut effective = requested;
        let period_size = {
            let mut hwp = step(NegotiationStep::Initialize, backend.hw_params_any())?;
            step(NegotiationStep::Access, hwp.set_access(requested.access))?;
            step(NegotiationStep::Format, hwp.set_format(requested.format))?;
            step(
                NegotiationStep::Channels,
                hwp.set_channels(requested.channels.count() as u32),
            )?;

            effective.rate_hz =
                step(NegotiationStep::Rate, hwp.set_rate_near(requested.rate_hz))?;
            if effective.rate_hz != requested.rate_hz {
                warn!(
                    "Selected sample rate does not match requested. Requested: {}Hz, got {}Hz.",
                    requested.rate_hz, effective.rate_hz
                );
            }

            effective.period_time_us = step(
                NegotiationStep::PeriodTime,
                hwp.set_period_time_near(requested.period_time_us),
            )?;
            if effective.period_time_us != requested.period_time_us {
                debug!(
                    "period time {}us granted as {}us",
                    requested.period_time_us, effective.period_time_us
                );
            }

            let period_size = step(NegotiationStep::PeriodSize, hwp.period_size())?;
            if period_size == 0 {
                let source = HwError::new("snd_pcm_hw_params_get_period_size", nix::libc::EINVAL);
                error!("{}", described(NegotiationStep::PeriodSize.description(), &source));
                return Err(PcmError::Negotiation {
                    step: NegotiationStep::PeriodSize,
                    source,
                });
            }
            step(NegotiationStep::Commit, backend.commit(&hwp))?;
            period_size
        };

        let negotiated = NegotiatedParams {
            params: effective,
            period_size,
            requested_rate_hz: requested.rate_hz,
        };
        debug!(
            "'{}' {} configured: {} {}Hz {}ch, period {} frames ({}us)",
            self.name(),
            self.direction(),
            effective.format,
            effective.rate_hz,
            effective.channels.count(),
            period_size,
            effective.period_time_us
        );
        self.negotiated = Some(negotiated);
        Ok(negotiated)
    }
}
