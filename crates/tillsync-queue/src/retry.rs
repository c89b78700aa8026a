//! Retry timing for failed deliveries.

use std::time::Duration;

use rand::Rng;

/// How long to wait before retrying a failed delivery.
///
/// The default is a fixed two-minute delay. Setting `multiplier` above one
/// grows the delay per consecutive failure up to `max_delay`; `jitter`
/// spreads each delay by up to that fraction either way.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Growth factor per consecutive failure.
    pub multiplier: f64,
    /// Upper bound for the grown delay, before jitter.
    pub max_delay: Duration,
    /// Fraction of the delay to randomize, in `0.0..=1.0`.
    pub jitter: f64,
}

impl RetryPolicy {
    /// A policy that always waits `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
            jitter: 0.0,
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    ///
    /// `failures` starts at one.
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let grown = self.base_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let capped = grown.min(self.max_delay.max(self.base_delay).as_secs_f64());

        let jitter = self.jitter.clamp(0.0, 1.0);
        let secs = if jitter > 0.0 {
            let spread = rand::thread_rng().gen_range(-jitter..=jitter);
            capped * (1.0 + spread)
        } else {
            capped
        };

        Duration::from_secs_f64(secs.max(0.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(120))
    }
}
