use rpcdns_domain::BackoffConfig;
use std::time::Duration;

/// Retry delay generator for failed resolutions.
///
/// The first delay is `initial`; each further call multiplies the previous
/// base by `multiplier` and caps it at `max`. Jitter is applied to the base
/// on the way out and never fed back, so bases are non-decreasing.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current: Option<Duration>,
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current: None,
            attempts: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let max = self.config.max();
        let base = match self.current {
            None => self.config.initial().min(max),
            Some(previous) => scale(previous, self.config.multiplier).min(max),
        };
        self.current = Some(base);
        self.attempts = self.attempts.saturating_add(1);

        apply_jitter(base, self.config.jitter).min(max)
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.attempts = 0;
    }

    /// Failed attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

fn scale(delay: Duration, factor: f64) -> Duration {
    let secs = delay.as_secs_f64() * factor;
    if !secs.is_finite() || secs < 0.0 || secs > u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_secs_f64(secs)
    }
}

fn apply_jitter(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return base;
    }
    // Uniform in [1 - jitter, 1 + jitter].
    let factor = 1.0 + (fastrand::f64() * 2.0 - 1.0) * jitter;
    scale(base, factor.max(0.0))
}
