//! Resilient request executor.
//!
//! [`RetryScheduler::execute`] turns one logical operation into a sequence of
//! physical attempts. Each attempt is classified once:
//!
//! 1. transport error: retryable
//! 2. `4xx` other than `429`: fatal, returned immediately
//! 3. `5xx` or `429`: retryable
//! 4. anything else: success
//!
//! Before every retry the wait doubles and gains a random jitter drawn from
//! `[0, wait * jitter_fraction)`. The result is clamped to whatever is left of
//! the overall budget, so elapsed time never runs past the deadline.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use reqwest::StatusCode;
use tokio::time::{self, Instant};

use crate::{
    AccountApiError, AttemptRunner, FailedAttempt, NoopObserver, RequestSpec, Result, RetryEvent,
    RetryObserver, RetryPolicy, Transport,
};

/// Far enough in the future to stand in for "no deadline".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// What one physical attempt produced, before it is turned into a result.
#[derive(Debug)]
pub enum Failure {
    Response(reqwest::Response),
    Transport(reqwest::Error),
}

impl Failure {
    /// Drains the response body so the connection is released.
    async fn into_failed_attempt(self) -> FailedAttempt {
        match self {
            Self::Response(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => FailedAttempt::Status { status, body },
                    Err(err) => FailedAttempt::Transport(err),
                }
            }
            Self::Transport(err) => FailedAttempt::Transport(err),
        }
    }
}

/// Classified outcome of one attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(reqwest::Response),
    RetryableFailure(Failure),
    FatalFailure(Failure),
}

impl AttemptOutcome {
    pub fn classify(result: reqwest::Result<reqwest::Response>) -> Self {
        match result {
            Err(err) => Self::RetryableFailure(Failure::Transport(err)),
            Ok(response) => {
                let status = response.status();
                if is_fatal_status(status) {
                    Self::FatalFailure(Failure::Response(response))
                } else if is_retryable_status(status) {
                    Self::RetryableFailure(Failure::Response(response))
                } else {
                    Self::Success(response)
                }
            }
        }
    }
}

/// Client errors are final, except `429 Too Many Requests`.
pub fn is_fatal_status(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status.as_u16() >= 500 || status == StatusCode::TOO_MANY_REQUESTS
}

/// Doubles `wait`, adds `jitter` and clamps the result to `remaining_budget`.
pub fn next_wait(wait: Duration, jitter: Duration, remaining_budget: Duration) -> Duration {
    wait.saturating_mul(2)
        .saturating_add(jitter)
        .min(remaining_budget)
}

/// Draws a jitter value uniformly from `[0, wait * fraction)`.
pub fn draw_jitter<R: Rng + ?Sized>(rng: &mut R, wait: Duration, fraction: f64) -> Duration {
    let upper = (wait.as_nanos() as f64 * fraction) as u64;
    if upper == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.random_range(0..upper))
}

/// Supplies the random source used for jitter, one per `execute` call.
///
/// Takes precedence over [`RetryPolicy::jitter_seed`].
pub trait JitterSource: Send + Sync {
    fn rng(&self) -> Box<dyn RngCore + Send>;
}

impl<F> JitterSource for F
where
    F: Fn() -> Box<dyn RngCore + Send> + Send + Sync,
{
    fn rng(&self) -> Box<dyn RngCore + Send> {
        self()
    }
}

/// Per-call mutable state. Owned by a single [`RetryScheduler::execute`] call.
struct RetryState {
    remaining_attempts: u32,
    wait: Duration,
    attempts: u32,
    deadline: Instant,
    rng: Box<dyn RngCore + Send>,
}

impl RetryState {
    fn new(policy: &RetryPolicy, jitter_source: Option<&dyn JitterSource>) -> Self {
        let started = Instant::now();
        let deadline = started
            .checked_add(policy.overall_timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let rng: Box<dyn RngCore + Send> = match (jitter_source, policy.jitter_seed) {
            (Some(source), _) => source.rng(),
            (None, Some(seed)) => Box::new(StdRng::seed_from_u64(seed)),
            (None, None) => Box::new(StdRng::from_os_rng()),
        };

        Self {
            remaining_attempts: policy.max_attempts,
            wait: policy.initial_wait,
            attempts: 0,
            deadline,
            rng,
        }
    }

    fn remaining_budget(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Computes the next wait and records it. Returns `(wait, jitter)`.
    fn advance(&mut self, jitter_fraction: f64, remaining_budget: Duration) -> (Duration, Duration) {
        let jitter = draw_jitter(self.rng.as_mut(), self.wait, jitter_fraction);
        self.wait = next_wait(self.wait, jitter, remaining_budget);
        (self.wait, jitter)
    }
}

/// Runs attempts until success, a fatal outcome, or budget exhaustion.
pub struct RetryScheduler<'a, T> {
    runner: &'a AttemptRunner<T>,
    policy: &'a RetryPolicy,
    observer: &'a dyn RetryObserver,
    jitter_source: Option<&'a dyn JitterSource>,
}

impl<'a, T: Transport> RetryScheduler<'a, T> {
    pub fn new(runner: &'a AttemptRunner<T>, policy: &'a RetryPolicy) -> Self {
        Self {
            runner,
            policy,
            observer: &NoopObserver,
            jitter_source: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RetryObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_jitter_source(mut self, jitter_source: &'a dyn JitterSource) -> Self {
        self.jitter_source = Some(jitter_source);
        self
    }

    /// Executes `spec` under the scheduler's policy.
    ///
    /// With `max_attempts == 0` the first non-fatal outcome is returned as-is:
    /// a `5xx`/`429` response comes back as `Ok`, a transport error as
    /// [`AccountApiError::Transport`].
    ///
    /// Every attempt, body drain and sleep is bounded by the overall deadline.
    /// Dropping the returned future aborts the in-flight attempt or the
    /// pending sleep.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<reqwest::Response> {
        let mut state = RetryState::new(self.policy, self.jitter_source);
        let mut last: Option<FailedAttempt> = None;

        loop {
            let budget = state.remaining_budget();
            if budget.is_zero() {
                return Err(self.deadline_exceeded(&state, last));
            }

            state.attempts += 1;
            let result =
                match time::timeout_at(state.deadline, self.runner.run(spec, Some(budget))).await {
                    Ok(result) => result?,
                    Err(_) => return Err(self.deadline_exceeded(&state, last.take())),
                };

            let failure = match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::FatalFailure(failure) => {
                    let drained = time::timeout_at(state.deadline, failure.into_failed_attempt());
                    let err = match drained.await {
                        Err(_) => return Err(self.deadline_exceeded(&state, last.take())),
                        Ok(FailedAttempt::Status { status, body }) => {
                            AccountApiError::Fatal { status, body }
                        }
                        Ok(FailedAttempt::Transport(err)) => AccountApiError::Transport(err),
                    };
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempts = state.attempts, error = %err, "http request failed, not retrying");
                    return Err(err);
                }
                AttemptOutcome::RetryableFailure(failure) if self.policy.max_attempts == 0 => {
                    return match failure {
                        Failure::Response(response) => Ok(response),
                        Failure::Transport(err) => Err(AccountApiError::Transport(err)),
                    };
                }
                AttemptOutcome::RetryableFailure(failure) => {
                    let drained = time::timeout_at(state.deadline, failure.into_failed_attempt());
                    match drained.await {
                        Ok(failure) => failure,
                        Err(_) => return Err(self.deadline_exceeded(&state, last.take())),
                    }
                }
            };

            if state.remaining_attempts == 0 {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = state.attempts, last = %failure, "retry budget exhausted");
                return Err(AccountApiError::RetryBudgetExhausted {
                    attempts: state.attempts,
                    last: failure,
                });
            }

            let budget = state.remaining_budget();
            if budget.is_zero() {
                return Err(self.deadline_exceeded(&state, Some(failure)));
            }

            let (wait, jitter) = state.advance(self.policy.jitter_fraction, budget);
            self.notify(RetryEvent {
                wait,
                jitter,
                remaining_attempts: state.remaining_attempts,
            });

            time::sleep(wait).await;
            state.remaining_attempts -= 1;
            last = Some(failure);
        }
    }

    fn notify(&self, event: RetryEvent) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.observer.on_retry(&event)));
        if outcome.is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!("retry observer panicked; ignoring");
        }
    }

    fn deadline_exceeded(&self, state: &RetryState, last: Option<FailedAttempt>) -> AccountApiError {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            attempts = state.attempts,
            budget = ?self.policy.overall_timeout,
            "overall request deadline exceeded"
        );
        AccountApiError::DeadlineExceeded {
            budget: self.policy.overall_timeout,
            attempts: state.attempts,
            last,
        }
    }
}
