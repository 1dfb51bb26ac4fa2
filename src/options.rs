use crate::RetryPolicy;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("accountapi-http/", env!("CARGO_PKG_VERSION"));

/// Configures retry behavior and request identification for a client.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Shared retry policy used when no per-call policy is given.
    pub retry: RetryPolicy,
    /// Reports every retry decision through `tracing` when enabled.
    pub debug_enabled: bool,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            debug_enabled: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}
