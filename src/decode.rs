use crate::{wire, Account, AccountApiError};

pub(crate) fn encode_account(account: &Account) -> Result<Vec<u8>, AccountApiError> {
    serde_json::to_vec(account)
        .map_err(|err| AccountApiError::Encode(format!("invalid account payload: {err}")))
}

pub(crate) fn decode_account(body: &str) -> Result<Account, AccountApiError> {
    serde_json::from_str::<Account>(body).map_err(|err| {
        AccountApiError::Decode(format!("invalid account response JSON: {err}; body: {body}"))
    })
}

/// Builds the domain error for a rejected `action` ("create", "fetch", ...).
///
/// The API's `error_message` is appended when the body carries one.
pub(crate) fn operation_error(action: &str, status: u16, body: String) -> AccountApiError {
    let message = match error_message(&body) {
        Some(detail) => format!("could not {action} the account: {detail}"),
        None => format!("could not {action} the account"),
    };
    AccountApiError::Operation {
        message,
        status,
        body,
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<wire::ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error_message)
        .map(|message| message.trim().to_owned())
        .filter(|message| !message.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{decode_account, operation_error};
    use crate::AccountApiError;

    #[test]
    fn operation_error_includes_api_message() {
        let err = operation_error(
            "create",
            400,
            r#"{"error_message":"organisation_id in body is required"}"#.to_owned(),
        );

        match err {
            AccountApiError::Operation {
                message, status, ..
            } => {
                assert_eq!(
                    message,
                    "could not create the account: organisation_id in body is required"
                );
                assert_eq!(status, 400);
            }
            other => panic!("expected operation error, got {other:?}"),
        }
    }

    #[test]
    fn operation_error_without_json_body_keeps_raw_body() {
        let err = operation_error("delete", 404, "404 page not found".to_owned());

        match err {
            AccountApiError::Operation { message, body, .. } => {
                assert_eq!(message, "could not delete the account");
                assert_eq!(body, "404 page not found");
            }
            other => panic!("expected operation error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_account_json_is_decode_error() {
        let err = decode_account("{not json").expect_err("must fail");
        assert!(matches!(err, AccountApiError::Decode(message) if message.contains("{not json")));
    }
}
