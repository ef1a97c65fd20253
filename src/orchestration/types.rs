//! # Orchestration Types
//!
//! Shared vocabulary between the generic driver and the entity handlers it
//! runs.

use std::time::Duration;

use crate::constants::defaults;

/// Outcome of one reconcile pass, telling the driver how to follow up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Converged; nothing to do until the entity changes again.
    Done,
    /// Made progress and expects more; run another pass immediately.
    RetryNow,
    /// Waiting on an external system; run another pass after the delay.
    RetryAfter(Duration),
}

impl Verdict {
    /// Delay before the next pass, if the verdict requests one.
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Verdict::Done => None,
            Verdict::RetryNow => Some(Duration::ZERO),
            Verdict::RetryAfter(delay) => Some(*delay),
        }
    }
}

/// Driver tuning knobs.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Upper bound on one reconcile pass, store round-trips included.
    pub deadline: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(defaults::RECONCILE_DEADLINE_SECS),
        }
    }
}

impl DriverConfig {
    /// Configuration sized for fast unit tests.
    pub fn for_testing() -> Self {
        Self {
            deadline: Duration::from_millis(250),
        }
    }
}
