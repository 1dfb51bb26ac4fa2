use std::future::Future;

/// Submits one physical request and returns the response or a transport error.
///
/// Implementations must tolerate concurrent use: several operations may share
/// one transport. Connection reuse and TLS are the implementation's concern.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = reqwest::Result<reqwest::Response>> + Send;
}

impl Transport for reqwest::Client {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = reqwest::Result<reqwest::Response>> + Send {
        self.execute(request)
    }
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = reqwest::Result<reqwest::Response>> + Send {
        (**self).send(request)
    }
}
