use std::time::Duration;

/// Last retryable outcome observed before the executor gave up.
#[derive(Debug, thiserror::Error)]
pub enum FailedAttempt {
    /// A response with a retryable status (`5xx` or `429`) and its body.
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    /// The request could not be dispatched or no response was obtained.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
}

impl FailedAttempt {
    /// Returns the status code when the attempt produced a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
        }
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AccountApiError {
    /// The request could not be constructed (invalid target syntax). Never retried.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Client-error status other than `429`, with the raw response body.
    #[error("http error {status}: {body}")]
    Fatal { status: u16, body: String },
    /// Every configured retry was consumed while outcomes stayed retryable.
    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        /// Physical attempts made, including the first one.
        attempts: u32,
        /// Outcome of the final attempt.
        last: FailedAttempt,
    },
    /// The overall time budget elapsed before a final outcome was reached.
    #[error("deadline of {budget:?} exceeded after {attempts} attempts")]
    DeadlineExceeded {
        budget: Duration,
        attempts: u32,
        /// Last retryable outcome, if an attempt completed before the deadline.
        last: Option<FailedAttempt>,
    },
    /// The API rejected an account operation.
    #[error("{message} (status {status})")]
    Operation {
        message: String,
        status: u16,
        body: String,
    },
    /// Request payload serialization error.
    #[error("encode error: {0}")]
    Encode(String),
    /// Response decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl AccountApiError {
    /// Returns `true` for failures caused by the overall time budget elapsing.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// Returns the HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fatal { status, .. } | Self::Operation { status, .. } => Some(*status),
            Self::RetryBudgetExhausted { last, .. } => last.status(),
            Self::DeadlineExceeded { last, .. } => last.as_ref().and_then(FailedAttempt::status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::MalformedRequest(_) | Self::Encode(_) | Self::Decode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AccountApiError, FailedAttempt};

    #[test]
    fn status_is_taken_from_last_attempt() {
        let err = AccountApiError::RetryBudgetExhausted {
            attempts: 4,
            last: FailedAttempt::Status {
                status: 503,
                body: "unavailable".to_owned(),
            },
        };
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("after 4 attempts"));
    }

    #[test]
    fn deadline_without_attempt_has_no_status() {
        let err = AccountApiError::DeadlineExceeded {
            budget: Duration::from_millis(5),
            attempts: 1,
            last: None,
        };
        assert!(err.is_deadline_exceeded());
        assert_eq!(err.status(), None);
    }
}
