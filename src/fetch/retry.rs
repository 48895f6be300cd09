// src/fetch/retry.rs

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff with additive jitter.
///
/// The wait after the `n`-th failed attempt (0-based) is
/// `min(base_delay * 2^n + jitter, max_delay)`, jitter drawn from
/// `[jitter_min, jitter_max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `n` (0-based) with a freshly drawn jitter.
    pub fn delay_for(&self, n: u32) -> Duration {
        self.delay_with_jitter(n, self.draw_jitter())
    }

    pub fn delay_with_jitter(&self, n: u32, jitter: Duration) -> Duration {
        let factor = 2u32.checked_pow(n).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    fn draw_jitter(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let range = self.jitter_min.as_secs_f64()..self.jitter_max.as_secs_f64();
        Duration::from_secs_f64(rand::rng().random_range(range))
    }
}
