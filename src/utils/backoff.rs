use std::time::Duration;

// ============================================================================
// Exponential Backoff
// ============================================================================
//
// Delay schedule for retrying after transient failures. The schedule only
// computes delays; callers decide how to wait so that the wait itself can
// be raced against cancellation.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay after the first failure
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor applied after each consecutive failure
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    next: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let next = config.initial_delay;
        Self { config, next, failures: 0 }
    }

    /// Delay to wait after another consecutive failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.failures = self.failures.saturating_add(1);
        self.next = Duration::from_millis(
            ((delay.as_millis() as f64) * self.config.multiplier) as u64
        )
        .min(self.config.max_delay);
        delay
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.next = self.config.initial_delay;
        self.failures = 0;
    }
}
