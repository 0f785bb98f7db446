use serde::Serialize;
use playground_config::AppConfig;
use playground_types::TransferDestination;
use playground_validator::{country_for_currency, payment_methods};

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyRails {
    currency: String,
    country: Option<&'static str>,
    rails: &'static [TransferDestination],
}

/// Rails for one currency, or for every configured currency.
pub fn run(config: &AppConfig, currency: Option<&str>) -> CommandResult {
    let currencies: Vec<String> = match currency {
        Some(currency) => vec![currency.to_uppercase()],
        None => config.playground.currencies.clone(),
    };

    let listing: Vec<CurrencyRails> = currencies
        .into_iter()
        .map(|currency| CurrencyRails {
            country: country_for_currency(&currency),
            rails: payment_methods(&currency),
            currency,
        })
        .collect();

    if let [only] = listing.as_slice() {
        if only.rails.is_empty() {
            return CommandResult::failure(
                "rails",
                "unknown_currency",
                format!("no payment rails for {}", only.currency),
                2,
            );
        }
    }
    CommandResult::success("rails", listing)
}
