use std::time::Duration;

use reqwest::{
    header::{self, HeaderValue},
    Url,
};

use crate::{AccountApiError, RequestSpec, Result, Transport};

/// Performs exactly one physical round trip through the injected transport.
///
/// No retries and no status interpretation happen here.
#[derive(Clone, Debug)]
pub struct AttemptRunner<T> {
    transport: T,
    user_agent: String,
}

impl<T: Transport> AttemptRunner<T> {
    pub fn new(transport: T, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub(crate) fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Builds the physical request for `spec`.
    ///
    /// `timeout` bounds the whole attempt on transports that honor
    /// [`reqwest::Request::timeout`].
    pub fn build(
        &self,
        spec: &RequestSpec,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Request> {
        let url = Url::parse(&spec.url).map_err(|err| {
            AccountApiError::MalformedRequest(format!("invalid url '{}': {err}", spec.url))
        })?;
        let user_agent = HeaderValue::from_str(&self.user_agent).map_err(|err| {
            AccountApiError::MalformedRequest(format!(
                "invalid user agent '{}': {err}",
                self.user_agent
            ))
        })?;

        let mut request = reqwest::Request::new(spec.method.clone(), url);
        let headers = request.headers_mut();
        headers.extend(spec.headers.clone());
        headers.insert(header::USER_AGENT, user_agent);

        if let Some(body) = &spec.body {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert_with(|| HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(body.clone().into());
        }

        *request.timeout_mut() = timeout;
        Ok(request)
    }

    /// Submits one request. The outer `Result` fails only when the request
    /// cannot be constructed.
    pub async fn run(
        &self,
        spec: &RequestSpec,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Result<reqwest::Response>> {
        let request = self.build(spec, timeout)?;
        Ok(self.transport.send(request).await)
    }
}
