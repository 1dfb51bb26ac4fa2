//! `accountapi-http` is an async HTTP client for the organisation accounts API.
//!
//! Every operation runs through a resilient request executor:
//! - [`AttemptRunner`] performs one physical round trip through an injected [`Transport`]
//! - [`RetryScheduler`] classifies each attempt, backs off with jitter and
//!   enforces the overall deadline of a [`RetryPolicy`]
//!
//! The account operations sit on top:
//! - [`AccountsService::create`]
//! - [`AccountsService::fetch`]
//! - [`AccountsService::delete`]

mod accounts;
mod attempt;
mod client;
mod decode;
mod error;
mod observer;
mod options;
mod policy;
mod request;
mod retry;
mod transport;
mod types;
mod wire;

pub use accounts::{AccountsService, RESOURCE_PATH};
pub use attempt::AttemptRunner;
pub use client::{AccountApiClient, DEFAULT_BASE_URL};
pub use error::{AccountApiError, FailedAttempt};
#[cfg(feature = "tracing")]
pub use observer::TracingObserver;
pub use observer::{NoopObserver, RetryEvent, RetryObserver};
pub use options::{ClientOptions, DEFAULT_USER_AGENT};
pub use policy::{
    RetryPolicy, DEFAULT_INITIAL_WAIT, DEFAULT_JITTER_FRACTION, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_OVERALL_TIMEOUT,
};
pub use request::RequestSpec;
pub use retry::{
    draw_jitter, is_fatal_status, is_retryable_status, next_wait, AttemptOutcome, Failure,
    JitterSource, RetryScheduler,
};
pub use transport::Transport;
pub use types::{Account, AccountAttributes, AccountData, ACCOUNT_TYPE};

pub type Result<T> = std::result::Result<T, AccountApiError>;
