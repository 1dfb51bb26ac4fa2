use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default wait before the first retry, before doubling and jitter.
pub const DEFAULT_INITIAL_WAIT: Duration = Duration::from_secs(1);
/// Default wall-clock budget for one logical operation.
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(60);
/// Default upper bound of the jitter, as a fraction of the current wait.
pub const DEFAULT_JITTER_FRACTION: f64 = 1.0 / 3.0;

/// Configures retry behavior for one logical operation.
///
/// The policy is read-only while an operation runs. It can be shared through
/// [`ClientOptions`](crate::ClientOptions) or passed per call.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt. `0` disables retries.
    pub max_attempts: u32,
    /// Wait interval the backoff starts from.
    pub initial_wait: Duration,
    /// Overall budget across all attempts and waits.
    pub overall_timeout: Duration,
    /// Jitter is drawn uniformly from `[0, wait * jitter_fraction)`.
    pub jitter_fraction: f64,
    /// Fixed seed for the jitter source. `None` seeds from the OS.
    pub jitter_seed: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_wait: DEFAULT_INITIAL_WAIT,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            jitter_seed: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_wait(mut self, initial_wait: Duration) -> Self {
        self.initial_wait = initial_wait;
        self
    }

    pub fn with_overall_timeout(mut self, overall_timeout: Duration) -> Self {
        self.overall_timeout = overall_timeout;
        self
    }

    /// Sets the jitter fraction, clamped to `[0, 1]`. Non-finite values disable jitter.
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Fixes the jitter sequence so waits are reproducible.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryPolicy;

    #[test]
    fn defaults_match_documented_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_wait, Duration::from_secs(1));
        assert_eq!(policy.overall_timeout, Duration::from_secs(60));
        assert!((policy.jitter_fraction - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(policy.jitter_seed, None);
    }

    #[test]
    fn jitter_fraction_is_clamped() {
        assert_eq!(RetryPolicy::default().with_jitter_fraction(4.0).jitter_fraction, 1.0);
        assert_eq!(RetryPolicy::default().with_jitter_fraction(-1.0).jitter_fraction, 0.0);
        assert_eq!(
            RetryPolicy::default()
                .with_jitter_fraction(f64::NAN)
                .jitter_fraction,
            0.0
        );
    }
}
