use crate::format::NegotiatedParams;
use crate::hw::traits::PcmBackend;
use crate::recovery::RecoveryPolicy;
use crate::state::{Direction, PcmState};
use tracing::debug;

/// An open PCM endpoint and everything learned about it.
///
/// Single owner: transfers take `&mut self`, so one handle never has two
/// transfers in flight. Share it across threads behind a `Mutex`.
pub struct PcmDevice<B: PcmBackend> {
    name: String,
    direction: Direction,
    pub(crate) backend: Option<B>,
    pub(crate) negotiated: Option<NegotiatedParams>,
    pub(crate) recovery: RecoveryPolicy,
    pub(crate) scratch: Vec<u8>,
}

impl<B: PcmBackend> std::fmt::Debug for PcmDevice<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmDevice")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("state", &self.state())
            .field("negotiated", &self.negotiated)
            .field("recovery", &self.recovery)
            .finish()
    }
}

impl<B: PcmBackend> PcmDevice<B> {
    pub fn from_backend(name: &str, direction: Direction, backend: B) -> Self {
        Self {
            name: name.to_string(),
            direction,
            backend: Some(backend),
            negotiated: None,
            recovery: RecoveryPolicy::default(),
            scratch: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> PcmState {
        match &self.backend {
            Some(backend) => backend.state(),
            None => PcmState::Closed,
        }
    }

    pub fn negotiated(&self) -> Option<&NegotiatedParams> {
        self.negotiated.as_ref()
    }

    pub fn period_size(&self) -> Option<usize> {
        self.negotiated.map(|n| n.period_size)
    }

    pub fn set_recovery_policy(&mut self, policy: RecoveryPolicy) {
        self.recovery = policy;
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    /// Releases the driver handle. Safe to call more than once and after a
    /// failed negotiation.
    pub fn close(&mut self) {
        if let Some(backend) = self.backend.take() {
            drop(backend);
            debug!("closed {} device '{}'", self.direction, self.name);
        }
        self.negotiated = None;
        self.scratch = Vec::new();
    }
}
