use reqwest::{StatusCode, Url};

use crate::{
    decode::{decode_account, encode_account, operation_error},
    Account, AccountApiClient, AccountApiError, RequestSpec, Result, Transport,
};

/// Path of the accounts resource, relative to the client's base URL.
pub const RESOURCE_PATH: &str = "/v1/organisation/accounts";

/// Create, fetch and delete operations on account records.
#[derive(Debug)]
pub struct AccountsService<'a, T> {
    client: &'a AccountApiClient<T>,
}

impl<'a, T: Transport> AccountsService<'a, T> {
    pub(crate) fn new(client: &'a AccountApiClient<T>) -> Self {
        Self { client }
    }

    /// Registers a new account. The API answers `201 Created` with the stored record.
    pub async fn create(&self, account: &Account) -> Result<Account> {
        let body = encode_account(account)?;
        let spec = RequestSpec::post(self.client.url(RESOURCE_PATH), body);
        let body = self.send("create", &spec, StatusCode::CREATED).await?;
        decode_account(&body)
    }

    /// Fetches a single account by id.
    pub async fn fetch(&self, account_id: &str) -> Result<Account> {
        let url = self.account_url(account_id)?;
        let spec = RequestSpec::get(url.as_str());
        let body = self.send("fetch", &spec, StatusCode::OK).await?;
        decode_account(&body)
    }

    /// Deletes the given version of an account.
    pub async fn delete(&self, account_id: &str, version: i64) -> Result<()> {
        let mut url = self.account_url(account_id)?;
        url.query_pairs_mut()
            .append_pair("version", &version.to_string());
        let spec = RequestSpec::delete(url.as_str());
        self.send("delete", &spec, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    fn account_url(&self, account_id: &str) -> Result<Url> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(AccountApiError::MalformedRequest(
                "account id must not be empty".to_owned(),
            ));
        }

        let base = self.client.url(RESOURCE_PATH);
        let mut url = Url::parse(&base).map_err(|err| {
            AccountApiError::MalformedRequest(format!("invalid url '{base}': {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AccountApiError::MalformedRequest(format!("url '{base}' cannot have a path"))
            })?
            .push(account_id);
        Ok(url)
    }

    /// Runs `spec` and returns the body when the status is `expected`.
    async fn send(&self, action: &str, spec: &RequestSpec, expected: StatusCode) -> Result<String> {
        let response = self
            .client
            .perform_request(spec)
            .await
            .map_err(|err| match err {
                AccountApiError::Fatal { status, body } => operation_error(action, status, body),
                other => other,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(AccountApiError::Transport)?;
        if status != expected {
            #[cfg(feature = "tracing")]
            tracing::debug!(%status, action, "unexpected account response status");
            return Err(operation_error(action, status.as_u16(), body));
        }

        Ok(body)
    }
}
