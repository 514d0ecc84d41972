// Bounded retry for hardware configuration writes
//
// Every configuration call goes through a RetryingConfigurator. The action is
// attempted until it reports success or the bound is reached. Running out of
// attempts raises the configurator's advisory instead of failing, so a module
// with a degraded device is still constructed.

use tracing::{debug, warn};

use crate::advisory::{Advisory, SharedSink};
use crate::config::MAXIMUM_RETRIES;
use crate::hardware::DeviceStatus;

/// Idle -> Attempting(k) -> Succeeded | Attempting(k + 1) | Exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// Attempt number `k` (1-based) is about to run
    Attempting(u32),
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl RetryState {
    /// Leave Idle. A bound of zero exhausts without attempting anything.
    pub fn start(self, bound: u32) -> Self {
        match self {
            RetryState::Idle if bound == 0 => RetryState::Exhausted { attempts: 0 },
            RetryState::Idle => RetryState::Attempting(1),
            other => other,
        }
    }

    /// Feed the result of the current attempt
    pub fn advance(self, status: DeviceStatus, bound: u32) -> Self {
        match self {
            RetryState::Attempting(k) if status.is_ok() => RetryState::Succeeded { attempts: k },
            RetryState::Attempting(k) if k < bound => RetryState::Attempting(k + 1),
            RetryState::Attempting(k) => RetryState::Exhausted { attempts: k },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. } | RetryState::Exhausted { .. }
        )
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RetryState::Succeeded { .. })
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u32 {
        match *self {
            RetryState::Idle => 0,
            RetryState::Attempting(k) => k - 1,
            RetryState::Succeeded { attempts } | RetryState::Exhausted { attempts } => attempts,
        }
    }
}

/// Applies configuration to one target, raising its advisory on exhaustion
pub struct RetryingConfigurator {
    bound: u32,
    advisory: Advisory,
    sink: SharedSink,
}

impl RetryingConfigurator {
    pub fn new(sink: SharedSink, advisory: Advisory) -> Self {
        Self::with_bound(sink, advisory, MAXIMUM_RETRIES)
    }

    pub fn with_bound(sink: SharedSink, advisory: Advisory, bound: u32) -> Self {
        Self {
            bound,
            advisory,
            sink,
        }
    }

    pub fn advisory(&self) -> &Advisory {
        &self.advisory
    }

    /// Run `action` until it succeeds or the bound is reached
    ///
    /// Success clears the advisory, exhaustion raises it. Never fails.
    pub fn run<F>(&self, mut action: F) -> RetryState
    where
        F: FnMut() -> DeviceStatus,
    {
        let mut state = RetryState::Idle.start(self.bound);

        while let RetryState::Attempting(k) = state {
            let status = action();
            if !status.is_ok() {
                debug!(
                    "{} attempt {}/{} returned {:?}",
                    self.advisory.group, k, self.bound, status
                );
            }
            state = state.advance(status, self.bound);
        }

        match state {
            RetryState::Succeeded { .. } => self.sink.clear(&self.advisory),
            RetryState::Exhausted { attempts } => {
                warn!(
                    "Giving up after {} attempts: {}",
                    attempts, self.advisory.text
                );
                self.sink.raise(&self.advisory);
            }
            RetryState::Idle | RetryState::Attempting(_) => {}
        }

        state
    }
}
