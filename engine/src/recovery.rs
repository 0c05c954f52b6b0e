use crate::error::{FaultCause, HwError, RecoveryError};
use crate::hw::config;
use crate::hw::error_fmt::described;
use crate::hw::traits::PcmBackend;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_RESUME_BACKOFF: Duration = Duration::from_secs(1);

/// How hard to try bringing a suspended device back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Wait between resume attempts that report "try again".
    pub resume_backoff: Duration,
    /// `None` retries until the driver stops saying "try again".
    pub max_resume_attempts: Option<u32>,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            resume_backoff: DEFAULT_RESUME_BACKOFF,
            max_resume_attempts: None,
        }
    }
}

impl RecoveryPolicy {
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overrides fields whose environment variable is set.
    pub fn with_env(mut self) -> Self {
        if let Some(ms) = config::env_u64(config::RESUME_BACKOFF_MS_ENV) {
            self.resume_backoff = Duration::from_millis(ms);
        }
        if let Some(max) = config::env_u64(config::RESUME_MAX_ATTEMPTS_ENV) {
            self.max_resume_attempts = Some(u32::try_from(max).unwrap_or(u32::MAX));
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Underrun cleared by a single prepare.
    Prepared,
    Resumed { attempts: u32 },
    /// Resume gave up or failed and prepare brought the device back instead.
    PreparedAfterSuspend { attempts: u32 },
}

/// Brings `backend` back to a transferable state after `fault`.
///
/// Faults other than underrun and suspend come back unchanged as
/// [`RecoveryError::Unrecoverable`].
pub fn recover<B: PcmBackend>(
    backend: &B,
    fault: HwError,
    policy: &RecoveryPolicy,
) -> Result<Recovery, RecoveryError> {
    match fault.cause() {
        FaultCause::Underrun => {
            warn!("{}", described("PCM underrun, preparing device.", &fault));
            prepare(backend, FaultCause::Underrun)?;
            Ok(Recovery::Prepared)
        }
        FaultCause::Suspended => {
            warn!("{}", described("PCM suspended, waiting for resume.", &fault));
            recover_suspend(backend, policy)
        }
        FaultCause::Other => {
            error!("{}", described("Unrecoverable PCM error.", &fault));
            Err(RecoveryError::Unrecoverable(fault))
        }
    }
}

fn recover_suspend<B: PcmBackend>(
    backend: &B,
    policy: &RecoveryPolicy,
) -> Result<Recovery, RecoveryError> {
    let mut attempts = 0_u32;
    loop {
        attempts = attempts.saturating_add(1);
        match backend.resume() {
            Ok(()) => {
                debug!("PCM resumed after {attempts} attempt(s)");
                return Ok(Recovery::Resumed { attempts });
            }
            Err(err) if err.is_again() => {
                if policy.max_resume_attempts.is_some_and(|max| attempts >= max) {
                    warn!("PCM still suspended after {attempts} resume attempts, preparing instead");
                    break;
                }
                std::thread::sleep(policy.resume_backoff);
            }
            Err(err) => {
                warn!("{}", described("Cannot resume PCM device, preparing instead.", &err));
                break;
            }
        }
    }
    prepare(backend, FaultCause::Suspended)?;
    Ok(Recovery::PreparedAfterSuspend { attempts })
}

fn prepare<B: PcmBackend>(backend: &B, cause: FaultCause) -> Result<(), RecoveryError> {
    backend.prepare().map_err(|source| {
        let desc = match cause {
            FaultCause::Underrun => "Attempt to recover from underrun failed.",
            FaultCause::Suspended => "Cannot recover from suspend.",
            FaultCause::Other => "Cannot prepare PCM device.",
        };
        error!("{}", described(desc, &source));
        RecoveryError::Prepare { cause, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_waits_a_second_without_ceiling() {
        let policy = RecoveryPolicy::default();
        assert_eq!(policy.resume_backoff, Duration::from_secs(1));
        assert_eq!(policy.max_resume_attempts, None);
    }

    // The only test in this crate that touches these variables.
    #[test]
    fn environment_overrides_configured_policy() {
        let configured = RecoveryPolicy {
            resume_backoff: Duration::from_millis(500),
            max_resume_attempts: Some(9),
        };
        unsafe {
            std::env::set_var(config::RESUME_MAX_ATTEMPTS_ENV, "3");
            std::env::set_var(config::RESUME_BACKOFF_MS_ENV, "20");
        }
        let policy = configured.with_env();
        let from_env = RecoveryPolicy::from_env();
        unsafe {
            std::env::remove_var(config::RESUME_MAX_ATTEMPTS_ENV);
            std::env::remove_var(config::RESUME_BACKOFF_MS_ENV);
        }

        assert_eq!(policy.max_resume_attempts, Some(3));
        assert_eq!(policy.resume_backoff, Duration::from_millis(20));
        assert_eq!(from_env.max_resume_attempts, Some(3));
        assert_eq!(configured.with_env(), configured);
    }
}
