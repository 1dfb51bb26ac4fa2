//! Retry observation hook.
//!
//! The scheduler reports every retry decision before it sleeps. Observers are
//! best-effort: a panicking observer is contained and never changes scheduling.

use std::time::Duration;

/// A single retry decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryEvent {
    /// Wait before the next attempt, after doubling, jitter and clamping.
    pub wait: Duration,
    /// Jitter component added to the doubled wait.
    pub jitter: Duration,
    /// Retries left before this one is consumed.
    pub remaining_attempts: u32,
}

/// Receives retry decisions.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, event: &RetryEvent);
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryEvent) + Send + Sync,
{
    fn on_retry(&self, event: &RetryEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_retry(&self, _event: &RetryEvent) {}
}

/// Emits a `debug` event per retry.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl RetryObserver for TracingObserver {
    fn on_retry(&self, event: &RetryEvent) {
        tracing::debug!(
            wait = ?event.wait,
            jitter = ?event.jitter,
            remaining_attempts = event.remaining_attempts,
            "http request failed, retrying"
        );
    }
}
