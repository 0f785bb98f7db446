use anyhow::{bail, Context};
use serde::Serialize;
use playground_config::AppConfig;
use playground_directory::{BankDirectory, TesterQuery};
use playground_types::Bank;
use playground_validator::{TesterProfile, TesterWhitelist};

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BankLookup {
    member_id: Option<String>,
    country: String,
    search: Option<String>,
    banks: Vec<Bank>,
}

/// Live directory lookup. Exit code 2 for a rejected tester, 3 when a service fails.
pub async fn run(
    config: &AppConfig,
    tester_id: &str,
    country: &str,
    search: Option<&str>,
    dev_key: Option<&str>,
) -> CommandResult {
    if !config.playground.is_whitelisted(tester_id) {
        return CommandResult::failure("banks", "invalid_tester", format!("{tester_id} is not a known tester"), 2);
    }
    match lookup(config, tester_id, &country.to_uppercase(), search, dev_key.unwrap_or_default()).await {
        Ok(result) => CommandResult::success("banks", result),
        Err(error) => CommandResult::failure("banks", "lookup", format!("{error:#}"), 3),
    }
}

async fn lookup(
    config: &AppConfig,
    tester_id: &str,
    country: &str,
    search: Option<&str>,
    dev_key: &str,
) -> anyhow::Result<BankLookup> {
    let profile = TesterProfile::from_tester_id(tester_id);
    let mut directory = BankDirectory::new(&config.api, None);
    directory
        .load_tester(
            TesterQuery {
                tester_id,
                member_type: Some(profile.member_type),
                tpp_callback: profile.tpp_callback,
            },
            &config.playground.countries,
        )
        .await
        .context("resolving tester")?;

    if !directory.countries().iter().any(|c| c.code == country) {
        bail!("{tester_id} cannot test in {country}");
    }

    directory.load_country(country, dev_key).await.context("loading banks")?;
    if let Some(query) = search {
        directory.search(country, query, dev_key).await.context("searching banks")?;
    }
    tracing::info!(country, count = directory.banks().len(), "bank lookup finished");

    Ok(BankLookup {
        member_id: directory.member_id().map(str::to_string),
        country: country.to_string(),
        search: search.map(str::to_string),
        banks: directory.banks().to_vec(),
    })
}
