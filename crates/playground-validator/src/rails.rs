//! Payment rails per currency and the beneficiary inputs each rail needs.

use playground_types::{Bank, RequestDraft, TransferDestination};

use crate::field_map::DraftField;

use playground_types::TransferDestination::*;

const EUR_RAILS: &[TransferDestination] = &[Sepa, SepaInstant];
const PLN_RAILS: &[TransferDestination] = &[Elixir, ExpressElixir, Sorbnet, BlueCash];
const GBP_RAILS: &[TransferDestination] = &[FasterPayments, Chaps, Bacs];
const NON_EURO_RAILS: &[TransferDestination] = &[EuDomesticNonEuro];
const SEK_RAILS: &[TransferDestination] = &[EuDomesticNonEuro, BankGiro, PlusGiro];

/// Rails offered for a currency, in display order. Empty for unknown currencies.
pub fn payment_methods(currency: &str) -> &'static [TransferDestination] {
    match currency {
        "EUR" => EUR_RAILS,
        "PLN" => PLN_RAILS,
        "GBP" => GBP_RAILS,
        "HUF" | "NOK" | "BGN" | "DKK" | "CZK" | "RON" => NON_EURO_RAILS,
        "SEK" => SEK_RAILS,
        _ => &[],
    }
}

/// Country implied by a non-euro currency.
pub fn country_for_currency(currency: &str) -> Option<&'static str> {
    Some(match currency {
        "PLN" => "PL",
        "GBP" => "GB",
        "HUF" => "HU",
        "NOK" => "NO",
        "BGN" => "BG",
        "DKK" => "DK",
        "CZK" => "CZ",
        "SEK" => "SE",
        "RON" => "RO",
        _ => return None,
    })
}

/// Inputs a currency needs before any rail is considered.
pub fn currency_required_fields(currency: &str) -> &'static [DraftField] {
    match currency {
        "GBP" => &[DraftField::AccountNumber, DraftField::SortCode],
        "EUR" | "HUF" | "NOK" | "BGN" | "DKK" | "CZK" | "RON" => &[DraftField::BeneficiaryIban],
        "PLN" => &[DraftField::AccountNumber],
        _ => &[],
    }
}

/// Inputs a rail needs. IBAN rails drop the IBAN when the bank takes a BBAN.
pub fn rail_required_fields(rail: TransferDestination, bank: Option<&Bank>) -> &'static [DraftField] {
    match rail {
        Sepa | SepaInstant | EuDomesticNonEuro => {
            if bank.is_some_and(Bank::accepts_bban) {
                &[]
            } else {
                &[DraftField::BeneficiaryIban]
            }
        }
        Elixir | ExpressElixir | Sorbnet | BlueCash => &[DraftField::AccountNumber],
        BankGiro => &[DraftField::BankgiroNumber],
        PlusGiro => &[DraftField::PlusgiroNumber],
        FasterPayments | Chaps | Bacs => &[DraftField::AccountNumber, DraftField::SortCode],
    }
}

/// Beneficiary inputs rendered for a rail, as `(field, required)`.
pub fn beneficiary_inputs(rail: TransferDestination, bank: Option<&Bank>) -> Vec<(DraftField, bool)> {
    match rail {
        Sepa | SepaInstant | EuDomesticNonEuro => vec![
            (DraftField::BeneficiaryIban, !bank.is_some_and(Bank::accepts_bban)),
            (DraftField::BeneficiaryBic, false),
        ],
        FasterPayments => vec![
            (DraftField::AccountNumber, true),
            (DraftField::SortCode, true),
            (DraftField::InstructionIdentification, false),
        ],
        _ => rail_required_fields(rail, bank).iter().map(|field| (*field, true)).collect(),
    }
}

/// First rail for the draft's currency, when a payment has none chosen yet.
pub fn default_transfer_destination(draft: &RequestDraft) -> Option<TransferDestination> {
    if !draft.request_type.is_payment() || draft.transfer_destination.is_some() {
        return None;
    }
    payment_methods(&draft.currency).first().copied()
}
