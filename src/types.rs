use serde::{Deserialize, Serialize};

/// Resource type of every account record.
pub const ACCOUNT_TYPE: &str = "accounts";

/// Envelope used by the accounts API for both requests and responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AccountData>,
}

impl Account {
    pub fn new(data: AccountData) -> Self {
        Self { data: Some(data) }
    }

    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.id.as_str())
    }

    pub fn version(&self) -> Option<i64> {
        self.data.as_ref().and_then(|data| data.version)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AccountAttributes>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organisation_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl AccountData {
    /// Builds an `accounts` record with the given identifiers.
    pub fn new(
        id: impl Into<String>,
        organisation_id: impl Into<String>,
        attributes: AccountAttributes,
    ) -> Self {
        Self {
            attributes: Some(attributes),
            id: id.into(),
            organisation_id: organisation_id.into(),
            kind: ACCOUNT_TYPE.to_owned(),
            version: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAttributes {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_classification: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub account_matching_opt_out: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_number: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_id_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bic: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iban: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub joint_account: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secondary_identification: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub switched: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}
