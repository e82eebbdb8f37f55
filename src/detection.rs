// Movie detection retry: idle -> pending -> (retrying)* -> done.
// Pure state; JS owns the actual timer and calls back on each attempt.

use serde::{Deserialize, Serialize};

/// Retry timing. Delays are `base * 2^(attempt - 1)`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// `None` retries forever.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,
}

fn default_base_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    16_000
}

fn default_max_attempts() -> Option<u32> {
    Some(5)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(32);
        self.base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetectionState {
    Idle,
    /// First extraction attempt in flight.
    Pending,
    Retrying { attempt: u32 },
    Done,
}

#[derive(Debug, Clone)]
pub struct DetectionRetry {
    policy: RetryPolicy,
    state: DetectionState,
}

impl DetectionRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        DetectionRetry {
            policy,
            state: DetectionState::Idle,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Begin detection. Has no effect while an attempt sequence is running.
    pub fn start(&mut self) {
        if matches!(self.state, DetectionState::Idle | DetectionState::Done) {
            self.state = DetectionState::Pending;
        }
    }

    /// Record a failed attempt. Returns the delay before the next one, or
    /// `None` when detection gives up (or was not running).
    pub fn on_failure(&mut self) -> Option<u64> {
        let attempt = match self.state {
            DetectionState::Pending => 1,
            DetectionState::Retrying { attempt } => attempt.saturating_add(1),
            DetectionState::Idle | DetectionState::Done => return None,
        };

        if let Some(max) = self.policy.max_attempts {
            if attempt > max {
                log::warn!("movie detection gave up after {} retries", max);
                self.state = DetectionState::Idle;
                return None;
            }
        }

        self.state = DetectionState::Retrying { attempt };
        let delay = self.policy.delay_for(attempt);
        log::debug!("movie detection retry #{} in {}ms", attempt, delay);
        Some(delay)
    }

    pub fn on_success(&mut self) {
        self.state = DetectionState::Done;
    }

    pub fn cancel(&mut self) {
        self.state = DetectionState::Idle;
    }
}

impl Default for DetectionRetry {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
