//! Reconnect delay policy.

use std::time::Duration;

use tracing::warn;

/// Exponential backoff bounded by a maximum delay and attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// `min(max_delay, base_delay * 2^attempt)`, saturating on overflow.
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    /// Delay before the next attempt, advancing `attempts`.
    ///
    /// Returns None once `attempts` has reached `max_attempts`; the counter
    /// is left untouched in that case, so it never exceeds the maximum.
    pub fn next_delay(&self, attempts: &mut u32) -> Option<Duration> {
        if *attempts >= self.max_attempts {
            warn!(attempts = *attempts, "max reconnect attempts reached");
            return None;
        }
        let delay = self.compute_delay(*attempts);
        *attempts += 1;
        Some(delay)
    }
}
