use std::time::Duration;

use accountapi_http::{
    Account, AccountApiClient, AccountAttributes, AccountData, ClientOptions, RetryEvent,
    RetryPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("ACCOUNTAPI_BASE_URL")?;

    let client = AccountApiClient::new(base_url)
        .with_options(ClientOptions {
            retry: RetryPolicy::default()
                .with_max_attempts(5)
                .with_initial_wait(Duration::from_millis(200))
                .with_overall_timeout(Duration::from_secs(30)),
            ..ClientOptions::default()
        })
        .with_observer(|event: &RetryEvent| {
            eprintln!(
                "retrying in {:?} (jitter {:?}, {} attempts left)",
                event.wait, event.jitter, event.remaining_attempts
            );
        });

    let account = Account::new(AccountData::new(
        "ad27e265-9605-4b4b-a0e5-3003ea9cc4dc",
        "eb0bd6f5-c3f5-44b2-b677-acd23cdde73c",
        AccountAttributes {
            country: "GB".to_owned(),
            base_currency: "GBP".to_owned(),
            bank_id: "400302".to_owned(),
            bank_id_code: "GBDSC".to_owned(),
            bic: "NWBKGB42".to_owned(),
            name: vec!["Samantha Holder".to_owned()],
            ..AccountAttributes::default()
        },
    ));

    let created = client.accounts().create(&account).await?;
    println!("created {created:?}");

    let id = created.id().unwrap_or_default().to_owned();
    let fetched = client.accounts().fetch(&id).await?;
    println!("fetched {fetched:?}");

    client
        .accounts()
        .delete(&id, fetched.version().unwrap_or(0))
        .await?;
    println!("deleted {id}");

    Ok(())
}
