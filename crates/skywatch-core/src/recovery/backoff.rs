//! Poll spacing for asynchronous queries

use std::time::Duration;

/// Growth curve for delays between status polls
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    /// Delays never grow past this
    pub max_delay: Duration,
    /// 1.0 gives a fixed interval
    pub multiplier: f64,
    /// Spread concurrent pollers by up to `jitter_ratio` of each delay
    pub jitter: bool,
    pub jitter_ratio: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
            jitter_ratio: 0.2,
        }
    }
}

impl BackoffConfig {
    pub fn with_initial_delay(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..Default::default()
        }
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Exponential delays capped at `max_delay`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay for the `attempt`-th wait (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_delay.as_secs_f64();
        let cap = self.config.max_delay.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        // powi saturates to inf, which the cap absorbs
        let delay = (initial * self.config.multiplier.powi(exponent)).min(cap).max(0.0);

        if self.config.jitter {
            let spread = delay * self.config.jitter_ratio;
            Duration::from_secs_f64(delay + clock_fraction() * spread)
        } else {
            Duration::from_secs_f64(delay)
        }
    }

    /// Delay for the next wait; advances the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Pseudo-random value in `[0, 1)` from the sub-second clock
fn clock_fraction() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos.wrapping_mul(2_654_435_761)) / (f64::from(u32::MAX) + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(initial: u64, max: u64, multiplier: f64) -> ExponentialBackoff {
        ExponentialBackoff::with_config(
            BackoffConfig::with_initial_delay(Duration::from_secs(initial))
                .max_delay(Duration::from_secs(max))
                .multiplier(multiplier),
        )
    }

    #[test]
    fn test_delays_double_until_cap() {
        let mut backoff = backoff(5, 30, 2.0);
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 30, 30]);
        assert_eq!(backoff.delay_for_attempt(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_multiplier_one_is_fixed_interval() {
        let backoff = backoff(5, 30, 1.0);
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(backoff.delay_for_attempt(7), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let backoff = ExponentialBackoff::with_config(
            BackoffConfig::with_initial_delay(Duration::from_secs(10)).jitter(true),
        );
        let delay = backoff.delay_for_attempt(0);
        assert!(delay >= Duration::from_secs(10));
        assert!(delay < Duration::from_secs(12));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = backoff(1, 60, 3.0);
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.next_delay(), Duration::from_secs(9));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
