//! Request configuration validator.
//!
//! Pure functions over a `RequestDraft` and the selected bank: whether the
//! draft can be submitted, which optional inputs to render, and the derived
//! updates that follow a field change. Nothing in this crate performs I/O.

use std::fmt;

use serde::Serialize;
use playground_types::{Bank, RequestDraft, TransferDestination};

pub mod field_map;
pub mod groups;
pub mod mutation;
pub mod rails;
pub mod tester;

pub use field_map::{DraftField, FieldList, MandatoryField, MANDATORY_FIELDS};
pub use groups::{required_field_groups, FieldGroups, FieldRequirement, GroupContext, VRP_TOKEN_ENV};
pub use mutation::{
    apply_bank_selection, on_account_toggle, on_field_change, on_metadata_change, select_country,
    FieldChangeOutcome, FieldValue, FormField, MetadataField, SideEffect,
};
pub use rails::{country_for_currency, default_transfer_destination, payment_methods};
pub use tester::{apply_customization_id, configure_tester, TesterProfile, TesterWhitelist};

/// Field message for a tester id missing from the whitelist.
pub const INVALID_TESTER_ID: &str = "Invalid Tester Id";
/// Field message for an IBAN the sandbox rejected.
pub const INVALID_IBAN: &str = "Invalid Iban";

/// First unmet requirement of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Blocker {
    NoAccessScope,
    MissingTransferDestination,
    MissingCurrencyField { currency: String, field: DraftField },
    MissingRailField { rail: TransferDestination, field: DraftField },
    MissingMandatoryField { name: &'static str },
    MissingCredential { id: String },
    InvalidIban,
    InvalidTesterId,
    MissingBank,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAccessScope => write!(f, "select at least one of accounts, balance or transactions"),
            Self::MissingTransferDestination => write!(f, "transfer destination is required"),
            Self::MissingCurrencyField { currency, field } => {
                write!(f, "{} is required for {currency}", field.name())
            }
            Self::MissingRailField { rail, field } => {
                write!(f, "{} is required for {rail}", field.name())
            }
            Self::MissingMandatoryField { name } => write!(f, "bank requires {name}"),
            Self::MissingCredential { id } => write!(f, "credential {id} is required"),
            Self::InvalidIban => write!(f, "{INVALID_IBAN}"),
            Self::InvalidTesterId => write!(f, "{INVALID_TESTER_ID}"),
            Self::MissingBank => write!(f, "bank is required"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submittability {
    Ready,
    Blocked(Blocker),
}

impl Submittability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn blocker(&self) -> Option<&Blocker> {
        match self {
            Self::Ready => None,
            Self::Blocked(blocker) => Some(blocker),
        }
    }
}

impl From<Result<(), Blocker>> for Submittability {
    fn from(result: Result<(), Blocker>) -> Self {
        match result {
            Ok(()) => Self::Ready,
            Err(blocker) => Self::Blocked(blocker),
        }
    }
}

/// Walk the readiness checks in order and report the first one that fails.
pub fn evaluate<W>(draft: &RequestDraft, bank: Option<&Bank>, whitelist: &W) -> Submittability
where
    W: TesterWhitelist + ?Sized,
{
    check(draft, bank, whitelist).into()
}

pub fn is_submittable<W>(draft: &RequestDraft, bank: Option<&Bank>, whitelist: &W) -> bool
where
    W: TesterWhitelist + ?Sized,
{
    evaluate(draft, bank, whitelist).is_ready()
}

fn check<W>(draft: &RequestDraft, bank: Option<&Bank>, whitelist: &W) -> Result<(), Blocker>
where
    W: TesterWhitelist + ?Sized,
{
    if draft.request_type.is_payment() {
        check_payment(draft, bank)?;
    } else if !draft.scopes.any() {
        return Err(Blocker::NoAccessScope);
    }

    if let Some(fields) = bank.and_then(|bank| bank.credential_fields.as_ref()) {
        if !draft.web_app_enabled && !draft.use_webapp_credentials_flow {
            let missing = fields.iter().find(|field| {
                draft.credential_fields.get(&field.id).map_or(true, String::is_empty)
            });
            if let Some(field) = missing {
                return Err(Blocker::MissingCredential { id: field.id.clone() });
            }
        }
    }

    if !draft.beneficiary_iban.is_empty() && !draft.is_iban_valid {
        return Err(Blocker::InvalidIban);
    }
    if !whitelist.is_whitelisted(&draft.tester_id) {
        return Err(Blocker::InvalidTesterId);
    }
    if draft.bank_id.is_empty() {
        return Err(Blocker::MissingBank);
    }
    Ok(())
}

fn check_payment(draft: &RequestDraft, bank: Option<&Bank>) -> Result<(), Blocker> {
    let rail = draft.transfer_destination.ok_or(Blocker::MissingTransferDestination)?;

    let unfilled = |fields: &'static [DraftField]| fields.iter().copied().find(|f| !f.is_filled(draft));

    if let Some(field) = unfilled(rails::currency_required_fields(&draft.currency)) {
        return Err(Blocker::MissingCurrencyField { currency: draft.currency.clone(), field });
    }
    if let Some(field) = unfilled(rails::rail_required_fields(rail, bank)) {
        return Err(Blocker::MissingRailField { rail, field });
    }

    if let Some(bank) = bank.filter(|bank| bank.mandatory_fields.is_some()) {
        if !draft.web_app_enabled {
            for list in FieldList::TRANSFER {
                if let Some(field) = field_map::first_unmet(bank, list, draft) {
                    return Err(Blocker::MissingMandatoryField { name: field.name });
                }
            }
        }
    }
    Ok(())
}

/// Field message for the tester id input, if any.
pub fn tester_id_message<W>(tester_id: &str, whitelist: &W) -> Option<&'static str>
where
    W: TesterWhitelist + ?Sized,
{
    (!tester_id.is_empty() && !whitelist.is_whitelisted(tester_id)).then_some(INVALID_TESTER_ID)
}

/// Field message for the IBAN input, if any.
pub fn iban_message(draft: &RequestDraft) -> Option<&'static str> {
    (!draft.beneficiary_iban.is_empty() && !draft.is_iban_valid).then_some(INVALID_IBAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_config::PlaygroundSettings;
    use playground_types::{AccessToggle, RequestType};
    use serde_json::json;
    use playground_types::TransferDestination::*;

    fn settings() -> PlaygroundSettings {
        PlaygroundSettings::default()
    }

    fn plain_bank() -> Bank {
        serde_json::from_value(json!({ "id": "ngp-bnp", "name": "BNP" })).unwrap()
    }

    fn bank_with(mandatory: serde_json::Value) -> Bank {
        serde_json::from_value(json!({
            "id": "ngp-bnp",
            "name": "BNP",
            "mandatoryFields": mandatory
        }))
        .unwrap()
    }

    fn access_draft() -> RequestDraft {
        let mut draft = RequestDraft::default();
        draft.tester_id = "Token".into();
        draft.bank_id = "ngp-bnp".into();
        draft
    }

    fn payment_draft(currency: &str, rail: TransferDestination) -> RequestDraft {
        let mut draft = access_draft();
        draft.request_type = RequestType::SinglePayment;
        draft.currency = currency.into();
        draft.transfer_destination = Some(rail);
        draft
    }

    fn blocker(draft: &RequestDraft, bank: Option<&Bank>) -> Option<Blocker> {
        evaluate(draft, bank, &settings()).blocker().cloned()
    }

    #[test]
    fn account_access_needs_a_scope() {
        let bank = plain_bank();
        let mut draft = access_draft();
        assert!(is_submittable(&draft, Some(&bank), &settings()));

        for toggle in [AccessToggle::Accounts, AccessToggle::Balance, AccessToggle::Transactions] {
            draft.scopes.set(toggle, false);
        }
        assert_eq!(blocker(&draft, Some(&bank)), Some(Blocker::NoAccessScope));

        draft.scopes.set(AccessToggle::Transactions, true);
        assert!(is_submittable(&draft, Some(&bank), &settings()));
    }

    #[test]
    fn account_access_ignores_access_mandatory_fields() {
        let bank = bank_with(json!({ "access": { "fields": ["iban", "currency"] } }));
        let mut draft = access_draft();
        draft.web_app_enabled = false;
        assert!(is_submittable(&draft, Some(&bank), &settings()));
    }

    #[test]
    fn gbp_faster_payments_needs_account_and_sort_code_in_any_order() {
        let bank = plain_bank();

        let mut draft = payment_draft("GBP", FasterPayments);
        assert!(!is_submittable(&draft, Some(&bank), &settings()));
        draft.account_number = "12345678".into();
        assert!(!is_submittable(&draft, Some(&bank), &settings()));
        draft.sort_code = "123456".into();
        assert!(is_submittable(&draft, Some(&bank), &settings()));

        let mut draft = payment_draft("GBP", FasterPayments);
        draft.sort_code = "123456".into();
        assert_eq!(
            blocker(&draft, Some(&bank)),
            Some(Blocker::MissingCurrencyField {
                currency: "GBP".into(),
                field: DraftField::AccountNumber
            })
        );
        draft.account_number = "12345678".into();
        assert!(is_submittable(&draft, Some(&bank), &settings()));
    }

    #[test]
    fn payment_without_rail_is_blocked() {
        let mut draft = payment_draft("EUR", Sepa);
        draft.transfer_destination = None;
        assert_eq!(blocker(&draft, None), Some(Blocker::MissingTransferDestination));
    }

    #[test]
    fn vrp_goes_through_payment_checks() {
        let mut draft = payment_draft("PLN", Elixir);
        draft.request_type = RequestType::VariableRecurringPayment;
        assert_eq!(
            blocker(&draft, None),
            Some(Blocker::MissingCurrencyField { currency: "PLN".into(), field: DraftField::AccountNumber })
        );
        draft.account_number = "1090".into();
        assert!(is_submittable(&draft, None, &settings()));
    }

    #[test]
    fn giro_rails_need_their_numbers() {
        let mut draft = payment_draft("SEK", BankGiro);
        assert_eq!(
            blocker(&draft, None),
            Some(Blocker::MissingRailField { rail: BankGiro, field: DraftField::BankgiroNumber })
        );
        draft.bankgiro_number = "5050-1055".into();
        assert!(is_submittable(&draft, None, &settings()));

        draft.transfer_destination = Some(PlusGiro);
        assert_eq!(
            blocker(&draft, None),
            Some(Blocker::MissingRailField { rail: PlusGiro, field: DraftField::PlusgiroNumber })
        );
    }

    #[test]
    fn bban_lifts_iban_requirement_for_non_euro_rail() {
        let draft = payment_draft("SEK", EuDomesticNonEuro);
        assert_eq!(
            blocker(&draft, Some(&plain_bank())),
            Some(Blocker::MissingRailField { rail: EuDomesticNonEuro, field: DraftField::BeneficiaryIban })
        );

        let bban_bank = bank_with(json!({ "transfer": { "domestic": { "fields": ["bban"] } } }));
        let mut draft = draft;
        draft.web_app_enabled = false;
        assert_eq!(
            blocker(&draft, Some(&bban_bank)),
            Some(Blocker::MissingMandatoryField { name: "bban" })
        );
        draft.bban = "1234567".into();
        assert!(is_submittable(&draft, Some(&bban_bank), &settings()));
    }

    #[test]
    fn mandatory_fields_apply_only_without_web_app() {
        let bank = bank_with(json!({
            "transfer": { "domestic": {
                "fields": ["debtorName"],
                "polishapiFields": ["deliveryMode"]
            } }
        }));
        let mut draft = payment_draft("PLN", Elixir);
        draft.account_number = "1090".into();
        assert!(is_submittable(&draft, Some(&bank), &settings()));

        draft.web_app_enabled = false;
        assert_eq!(
            blocker(&draft, Some(&bank)),
            Some(Blocker::MissingMandatoryField { name: "debtorName" })
        );
        draft.debtor_legal_name = "Bob".into();
        assert_eq!(
            blocker(&draft, Some(&bank)),
            Some(Blocker::MissingMandatoryField { name: "deliveryMode" })
        );
        draft.metadata.delivery_mode = "STANDARD_D1".into();
        assert!(is_submittable(&draft, Some(&bank), &settings()));
    }

    #[test]
    fn credentials_are_required_unless_collected_by_web_app() {
        let bank: Bank = serde_json::from_value(json!({
            "id": "ngp-bnp",
            "name": "BNP",
            "credentialFields": [{ "id": "username", "displayName": "Username" }]
        }))
        .unwrap();
        let mut draft = access_draft();
        assert!(is_submittable(&draft, Some(&bank), &settings()));

        draft.web_app_enabled = false;
        assert_eq!(
            blocker(&draft, Some(&bank)),
            Some(Blocker::MissingCredential { id: "username".into() })
        );

        draft.use_webapp_credentials_flow = true;
        assert!(is_submittable(&draft, Some(&bank), &settings()));

        draft.use_webapp_credentials_flow = false;
        draft.credential_fields.insert("username".into(), "alice".into());
        assert!(is_submittable(&draft, Some(&bank), &settings()));
    }

    #[test]
    fn unvalidated_iban_is_never_submittable() {
        let mut draft = payment_draft("EUR", Sepa);
        draft.beneficiary_iban = "DE89370400440532013000".into();
        assert_eq!(blocker(&draft, None), Some(Blocker::InvalidIban));
        assert_eq!(iban_message(&draft), Some(INVALID_IBAN));

        draft.is_iban_valid = true;
        assert!(is_submittable(&draft, None, &settings()));
        assert_eq!(iban_message(&draft), None);
    }

    #[test]
    fn tester_and_bank_are_checked_last() {
        let mut draft = access_draft();
        draft.tester_id = "intruder".into();
        draft.bank_id.clear();
        assert_eq!(blocker(&draft, None), Some(Blocker::InvalidTesterId));

        draft.tester_id = "type2token".into();
        assert_eq!(blocker(&draft, None), Some(Blocker::MissingBank));
    }

    #[test]
    fn tester_message_only_for_unknown_ids() {
        let settings = settings();
        assert_eq!(tester_id_message("", &settings), None);
        assert_eq!(tester_id_message("TOKEN", &settings), None);
        assert_eq!(tester_id_message("intruder", &settings), Some(INVALID_TESTER_ID));
    }

    #[test]
    fn blockers_serialize_with_reason() {
        let value = serde_json::to_value(Blocker::MissingRailField {
            rail: FasterPayments,
            field: DraftField::SortCode,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "reason": "missingRailField", "rail": "fasterPayments", "field": "sortCode" })
        );
        assert_eq!(Blocker::InvalidIban.to_string(), "Invalid Iban");
    }

    #[test]
    fn whitelist_works_through_trait_objects() {
        let settings = settings();
        let whitelist: &dyn TesterWhitelist = &settings;
        assert!(is_submittable(&access_draft(), None, whitelist));
    }
}
