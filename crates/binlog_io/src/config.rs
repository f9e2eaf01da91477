//! Configuration for binlog I/O.

use std::time::Duration;

/// Default capacity of the task pool shared by uploads and downloads.
pub const DEFAULT_POOL_SIZE: usize = 32;

/// Default pause between two attempts of the same write.
pub const DEFAULT_WRITE_BACKOFF: Duration = Duration::from_millis(50);

/// Configuration for binlog uploads and downloads.
#[derive(Debug, Clone)]
pub struct BinlogIoConfig {
    /// Capacity of the bounded task pool.
    pub pool_size: usize,
    /// Retry policy for reads.
    pub read_retry: RetryConfig,
    /// Fixed pause between write attempts.
    pub write_backoff: Duration,
}

impl BinlogIoConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            read_retry: RetryConfig::default(),
            write_backoff: DEFAULT_WRITE_BACKOFF,
        }
    }

    /// Sets the task pool capacity. Zero is raised to one.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Sets the read retry policy.
    pub fn with_read_retry(mut self, retry: RetryConfig) -> Self {
        self.read_retry = retry;
        self
    }

    /// Sets the pause between write attempts.
    pub fn with_write_backoff(mut self, backoff: Duration) -> Self {
        self.write_backoff = backoff;
        self
    }
}

impl Default for BinlogIoConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for bounded retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a retry configuration with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        Duration::from_secs_f64(base_delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = BinlogIoConfig::default();
        assert_eq!(config.pool_size, 32);
        assert_eq!(config.read_retry.max_attempts, 3);
        assert_eq!(config.write_backoff, Duration::from_millis(50));
    }

    #[test]
    fn config_builder() {
        let config = BinlogIoConfig::new()
            .with_pool_size(0)
            .with_read_retry(RetryConfig::no_retry())
            .with_write_backoff(Duration::from_millis(5));

        assert_eq!(config.pool_size, 1);
        assert_eq!(config.read_retry.max_attempts, 1);
        assert_eq!(config.write_backoff, Duration::from_millis(5));
    }

    #[test]
    fn retry_delays_grow_and_cap() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(250));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(250));
    }

    #[test]
    fn no_retry_has_single_attempt() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);
    }
}
