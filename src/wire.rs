use serde::Deserialize;

/// Error body returned by the accounts API on rejected requests.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_message: Option<String>,
}
