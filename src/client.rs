use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    accounts::AccountsService, AttemptRunner, ClientOptions, JitterSource, NoopObserver,
    RequestSpec, Result, RetryObserver, RetryPolicy, RetryScheduler, Transport,
};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://accountapi:8080";

#[derive(Clone)]
/// HTTP client for the organisation accounts API.
///
/// Every request goes through a [`RetryScheduler`], so transient failures are
/// retried with exponential backoff and jitter within the overall deadline.
pub struct AccountApiClient<T = reqwest::Client> {
    runner: AttemptRunner<T>,
    base_url: String,
    options: ClientOptions,
    observer: Option<Arc<dyn RetryObserver>>,
    jitter_source: Option<Arc<dyn JitterSource>>,
}

impl<T> fmt::Debug for AccountApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountApiClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("custom_observer", &self.observer.is_some())
            .field("custom_jitter_source", &self.jitter_source.is_some())
            .finish()
    }
}

impl Default for AccountApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AccountApiClient {
    /// Creates a client backed by a default `reqwest` connection pool.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, reqwest::Client::new())
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `ACCOUNTAPI_BASE_URL`: API base URL (e.g. `http://localhost:8080`)
    /// - `ACCOUNTAPI_TIMEOUT_MS`: optional overall budget per operation
    /// - `ACCOUNTAPI_RETRY_ATTEMPTS`: optional maximum number of retries
    /// - `ACCOUNTAPI_RETRY_WAIT_MS`: optional initial wait between retries
    /// - `ACCOUNTAPI_DEBUG`: optional, `true`/`1` logs every retry
    ///
    /// Returns an error if the base URL is missing or a value cannot be parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use accountapi_http::AccountApiClient;
    ///
    /// let client = AccountApiClient::from_env().expect("missing ACCOUNTAPI_BASE_URL");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("ACCOUNTAPI_BASE_URL")
            .map_err(|_| "missing ACCOUNTAPI_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("ACCOUNTAPI_BASE_URL is set but empty".to_owned());
        }

        let mut options = ClientOptions::default();
        if let Some(ms) = env_number("ACCOUNTAPI_TIMEOUT_MS")? {
            options.retry.overall_timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = env_number("ACCOUNTAPI_RETRY_ATTEMPTS")? {
            options.retry.max_attempts = u32::try_from(attempts)
                .map_err(|_| format!("ACCOUNTAPI_RETRY_ATTEMPTS is too large: {attempts}"))?;
        }
        if let Some(ms) = env_number("ACCOUNTAPI_RETRY_WAIT_MS")? {
            options.retry.initial_wait = Duration::from_millis(ms);
        }
        if let Ok(debug) = std::env::var("ACCOUNTAPI_DEBUG") {
            options.debug_enabled = parse_flag(&debug);
        }

        Ok(Self::new(base_url).with_options(options))
    }
}

impl<T: Transport> AccountApiClient<T> {
    /// Creates a client that submits requests through `transport`.
    pub fn with_transport(base_url: impl Into<String>, transport: T) -> Self {
        let options = ClientOptions::default();
        Self {
            runner: AttemptRunner::new(transport, options.user_agent.clone()),
            base_url: normalize_base_url(base_url.into()),
            options,
            observer: None,
            jitter_source: None,
        }
    }

    /// Applies client options such as the retry policy and user agent.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.runner.set_user_agent(opts.user_agent.clone());
        self.options = opts;
        self
    }

    /// Installs an observer that receives every retry decision.
    ///
    /// Takes precedence over the `tracing` observer enabled by
    /// [`ClientOptions::debug_enabled`].
    pub fn with_observer(mut self, observer: impl RetryObserver + 'static) -> Self {
        let observer: Arc<dyn RetryObserver> = Arc::new(observer);
        self.observer = Some(observer);
        self
    }

    /// Installs the random source used for backoff jitter.
    ///
    /// Takes precedence over [`RetryPolicy::jitter_seed`].
    pub fn with_jitter_source(mut self, source: impl JitterSource + 'static) -> Self {
        let source: Arc<dyn JitterSource> = Arc::new(source);
        self.jitter_source = Some(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        self.runner.transport()
    }

    /// Account operations.
    pub fn accounts(&self) -> AccountsService<'_, T> {
        AccountsService::new(self)
    }

    /// Performs `spec` under the client's shared retry policy.
    pub async fn perform_request(&self, spec: &RequestSpec) -> Result<reqwest::Response> {
        self.perform_request_with_policy(spec, &self.options.retry)
            .await
    }

    /// Performs `spec` under a per-call retry policy.
    pub async fn perform_request_with_policy(
        &self,
        spec: &RequestSpec,
        policy: &RetryPolicy,
    ) -> Result<reqwest::Response> {
        let scheduler = RetryScheduler::new(&self.runner, policy).with_observer(self.observer());
        match &self.jitter_source {
            Some(source) => scheduler.with_jitter_source(&**source).execute(spec).await,
            None => scheduler.execute(spec).await,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn observer(&self) -> &dyn RetryObserver {
        match &self.observer {
            Some(observer) => &**observer,
            None if self.options.debug_enabled => debug_observer(),
            None => &NoopObserver,
        }
    }
}

#[cfg(feature = "tracing")]
fn debug_observer() -> &'static dyn RetryObserver {
    &crate::TracingObserver
}

#[cfg(not(feature = "tracing"))]
fn debug_observer() -> &'static dyn RetryObserver {
    &NoopObserver
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_owned()
}

fn env_number(name: &str) -> std::result::Result<Option<u64>, String> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| format!("{name} must be a non-negative integer: {err}")),
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{normalize_base_url, parse_flag, AccountApiClient};
    use crate::ClientOptions;

    #[test]
    fn base_url_trailing_slash_is_removed() {
        assert_eq!(
            normalize_base_url(" http://localhost:8080/ ".to_owned()),
            "http://localhost:8080".to_owned()
        );
    }

    #[test]
    fn debug_flag_accepts_common_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("ON"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn options_update_user_agent() {
        let client = AccountApiClient::new("http://localhost:8080").with_options(ClientOptions {
            user_agent: "custom-agent".to_owned(),
            ..ClientOptions::default()
        });
        assert_eq!(client.runner.user_agent(), "custom-agent");
        assert_eq!(
            client.url("/v1/organisation/accounts"),
            "http://localhost:8080/v1/organisation/accounts"
        );
    }

    #[test]
    fn shared_transport_can_back_several_clients() {
        let transport = Arc::new(reqwest::Client::new());
        let first = AccountApiClient::with_transport("http://a.test", Arc::clone(&transport));
        let second = first.clone();

        assert_eq!(Arc::strong_count(&transport), 3);
        assert_eq!(second.base_url(), "http://a.test");
    }

    #[test]
    fn debug_output_lists_configuration() {
        let client = AccountApiClient::new("http://localhost:8080");
        let debug = format!("{client:?}");
        assert!(debug.contains("http://localhost:8080"));
        assert!(debug.contains("custom_observer: false"));
        assert!(debug.contains("custom_jitter_source: false"));
    }
}
