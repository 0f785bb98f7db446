//! Field-change rules: normalization and derived updates applied when the
//! operator edits a draft.
//!
//! Nothing here performs I/O. Work the caller must do (persisting the tester
//! profile, reloading banks for a new country) comes back as `SideEffect`s.

use std::str::FromStr;

use serde::Serialize;
use playground_config::PlaygroundSettings;
use playground_types::{AccessToggle, Bank, PlaygroundError, RequestDraft, RequestType, Result};

use crate::rails::country_for_currency;
use crate::tester::{apply_customization_id, configure_tester, TesterProfile};

/// Form inputs accepted by `on_field_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    RequestType,
    Accounts,
    Balance,
    Transactions,
    Description,
    RefId,
    Amount,
    Currency,
    Country,
    TesterId,
    TransferDestination,
    BankId,
    BeneficiaryIban,
    BeneficiaryBic,
    AccountNumber,
    SortCode,
    BankgiroNumber,
    PlusgiroNumber,
    Bban,
    ClearingNumber,
    InstructionIdentification,
    CreditorLegalName,
    DebtorLegalName,
    DebtorIban,
    DebtorBic,
    AddressStreet,
    AddressHouseNumber,
    AddressPostCode,
    AddressCity,
    AddressCountry,
    AccessIban,
    AccessCurrency,
    CustomizationId,
    DevKey,
    WebAppEnabled,
    UseWebappCredentialsFlow,
    UseCredentialFlow,
    TppCallback,
    ReturnRefundAccount,
    DisableFutureDatedPaymentConversion,
}

const FORM_FIELDS: &[(&str, FormField)] = &[
    ("requestType", FormField::RequestType),
    ("accounts", FormField::Accounts),
    ("balance", FormField::Balance),
    ("transactions", FormField::Transactions),
    ("description", FormField::Description),
    ("refId", FormField::RefId),
    ("amount", FormField::Amount),
    ("currency", FormField::Currency),
    ("country", FormField::Country),
    ("testerId", FormField::TesterId),
    ("transferDestination", FormField::TransferDestination),
    ("bankId", FormField::BankId),
    ("beneficiaryIban", FormField::BeneficiaryIban),
    ("beneficiaryBic", FormField::BeneficiaryBic),
    ("accountNumber", FormField::AccountNumber),
    ("sortCode", FormField::SortCode),
    ("bankgiroNumber", FormField::BankgiroNumber),
    ("plusgiroNumber", FormField::PlusgiroNumber),
    ("bban", FormField::Bban),
    ("clearingNumber", FormField::ClearingNumber),
    ("instructionIdentification", FormField::InstructionIdentification),
    ("creditorLegalName", FormField::CreditorLegalName),
    ("debtorLegalName", FormField::DebtorLegalName),
    ("debtorIban", FormField::DebtorIban),
    ("debtorBic", FormField::DebtorBic),
    ("addressStreet", FormField::AddressStreet),
    ("addressHouseNumber", FormField::AddressHouseNumber),
    ("addressPostCode", FormField::AddressPostCode),
    ("addressCity", FormField::AddressCity),
    ("addressCountry", FormField::AddressCountry),
    ("accessIban", FormField::AccessIban),
    ("accessCurrency", FormField::AccessCurrency),
    ("customizationId", FormField::CustomizationId),
    ("devKey", FormField::DevKey),
    ("webAppEnabled", FormField::WebAppEnabled),
    ("useWebappCredentialsFlow", FormField::UseWebappCredentialsFlow),
    ("useCredentialFlow", FormField::UseCredentialFlow),
    ("tppCallback", FormField::TppCallback),
    ("returnRefundAccount", FormField::ReturnRefundAccount),
    (
        "disableFutureDatedPaymentConversion",
        FormField::DisableFutureDatedPaymentConversion,
    ),
];

impl FormField {
    pub fn as_str(&self) -> &'static str {
        FORM_FIELDS
            .iter()
            .find(|(_, field)| field == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    fn is_upper_cased(&self) -> bool {
        matches!(
            self,
            Self::BeneficiaryIban | Self::BeneficiaryBic | Self::DebtorIban | Self::DebtorBic
        )
    }

    fn reconfigures_tester(&self) -> bool {
        matches!(self, Self::TesterId | Self::RequestType | Self::BankId)
    }
}

impl FromStr for FormField {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self> {
        FORM_FIELDS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, field)| *field)
            .ok_or_else(|| PlaygroundError::UnknownField(s.to_string()))
    }
}

/// New value for a form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    fn into_text(self, field: FormField) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Flag(_) => Err(PlaygroundError::InvalidFieldValue {
                field: field.as_str().to_string(),
                expected: "text",
            }),
        }
    }

    fn flag(&self, field: FormField) -> Result<bool> {
        match self {
            Self::Flag(flag) => Ok(*flag),
            Self::Text(_) => Err(PlaygroundError::InvalidFieldValue {
                field: field.as_str().to_string(),
                expected: "true or false",
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Work left to the caller after a field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SideEffect {
    /// Persist the reconfigured tester profile.
    PersistTester(TesterProfile),
    /// Country switched and the bank selection was cleared; reload banks.
    CountryChanged { country: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChangeOutcome {
    pub effects: Vec<SideEffect>,
}

impl FieldChangeOutcome {
    fn push(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    pub fn country_changed(&self) -> Option<&str> {
        self.effects.iter().find_map(|effect| match effect {
            SideEffect::CountryChanged { country } => Some(country.as_str()),
            _ => None,
        })
    }

    pub fn tester_profile(&self) -> Option<&TesterProfile> {
        self.effects.iter().find_map(|effect| match effect {
            SideEffect::PersistTester(profile) => Some(profile),
            _ => None,
        })
    }
}

/// Apply an edit to one form input.
pub fn on_field_change(
    draft: &mut RequestDraft,
    field: FormField,
    value: FieldValue,
    settings: &PlaygroundSettings,
) -> Result<FieldChangeOutcome> {
    let mut outcome = FieldChangeOutcome::default();

    match field {
        FormField::RequestType => {
            let request_type: RequestType = value.into_text(field)?.parse()?;
            draft.request_type = request_type;
            if request_type == RequestType::AccountAccess {
                draft.scopes.enable_all();
            }
        }
        FormField::TransferDestination => {
            let text = value.into_text(field)?;
            draft.transfer_destination = if text.is_empty() { None } else { Some(text.parse()?) };
        }
        FormField::Accounts => draft.scopes.set(AccessToggle::Accounts, value.flag(field)?),
        FormField::Balance => draft.scopes.set(AccessToggle::Balance, value.flag(field)?),
        FormField::Transactions => draft.scopes.set(AccessToggle::Transactions, value.flag(field)?),
        FormField::DisableFutureDatedPaymentConversion => {
            draft.disable_future_dated_payment_conversion = !value.flag(field)?;
        }
        FormField::WebAppEnabled => draft.web_app_enabled = value.flag(field)?,
        FormField::UseWebappCredentialsFlow => {
            draft.use_webapp_credentials_flow = value.flag(field)?;
        }
        FormField::UseCredentialFlow => draft.use_credential_flow = value.flag(field)?,
        FormField::TppCallback => draft.tpp_callback = value.flag(field)?,
        FormField::ReturnRefundAccount => draft.return_refund_account = value.flag(field)?,
        _ => {
            let mut text = value.into_text(field)?;
            if field.is_upper_cased() {
                text = text.to_uppercase();
            }
            if let Some(slot) = text_slot(draft, field) {
                *slot = text;
            }
        }
    }

    if matches!(field, FormField::TesterId | FormField::RequestType) {
        apply_customization_id(draft, settings);
    }
    if field.reconfigures_tester() {
        if let Some(profile) = configure_tester(draft, settings) {
            outcome.push(SideEffect::PersistTester(profile));
        }
    }
    if field == FormField::Currency {
        if let Some(country) = country_for_currency(&draft.currency) {
            outcome.effects.extend(select_country(draft, country, settings).effects);
        }
        draft.transfer_destination = None;
    }

    Ok(outcome)
}

fn text_slot(draft: &mut RequestDraft, field: FormField) -> Option<&mut String> {
    Some(match field {
        FormField::Description => &mut draft.description,
        FormField::RefId => &mut draft.ref_id,
        FormField::Amount => &mut draft.amount,
        FormField::Currency => &mut draft.currency,
        FormField::Country => &mut draft.country,
        FormField::TesterId => &mut draft.tester_id,
        FormField::BankId => &mut draft.bank_id,
        FormField::BeneficiaryIban => &mut draft.beneficiary_iban,
        FormField::BeneficiaryBic => &mut draft.beneficiary_bic,
        FormField::AccountNumber => &mut draft.account_number,
        FormField::SortCode => &mut draft.sort_code,
        FormField::BankgiroNumber => &mut draft.bankgiro_number,
        FormField::PlusgiroNumber => &mut draft.plusgiro_number,
        FormField::Bban => &mut draft.bban,
        FormField::ClearingNumber => &mut draft.clearing_number,
        FormField::InstructionIdentification => &mut draft.instruction_identification,
        FormField::CreditorLegalName => &mut draft.creditor_legal_name,
        FormField::DebtorLegalName => &mut draft.debtor_legal_name,
        FormField::DebtorIban => &mut draft.debtor_iban,
        FormField::DebtorBic => &mut draft.debtor_bic,
        FormField::AddressStreet => &mut draft.address_street,
        FormField::AddressHouseNumber => &mut draft.address_house_number,
        FormField::AddressPostCode => &mut draft.address_post_code,
        FormField::AddressCity => &mut draft.address_city,
        FormField::AddressCountry => &mut draft.address_country,
        FormField::AccessIban => &mut draft.access_iban,
        FormField::AccessCurrency => &mut draft.access_currency,
        FormField::CustomizationId => &mut draft.customization_id,
        FormField::DevKey => &mut draft.dev_key,
        _ => return None,
    })
}

/// Switch country. Clears the bank selection, which reconfigures the tester.
pub fn select_country(
    draft: &mut RequestDraft,
    country: &str,
    settings: &PlaygroundSettings,
) -> FieldChangeOutcome {
    let mut outcome = FieldChangeOutcome::default();
    draft.country = country.to_string();
    draft.bank_id.clear();
    if let Some(profile) = configure_tester(draft, settings) {
        outcome.push(SideEffect::PersistTester(profile));
    }
    outcome.push(SideEffect::CountryChanged { country: country.to_string() });
    outcome
}

/// Set one access toggle, then recompute the umbrella `accounts` flag.
///
/// `accounts` only follows balance and transactions; toggling it directly is
/// overridden.
pub fn on_account_toggle(draft: &mut RequestDraft, toggle: AccessToggle, checked: bool) {
    draft.scopes.set(toggle, checked);
    let scopes = &mut draft.scopes;
    scopes.accounts = scopes.balance || scopes.transactions;
}

/// Metadata inputs for STET and Polish API banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    CreditorAgentBicFi,
    CreditorAgentName,
    DeliveryMode,
}

impl FromStr for MetadataField {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "creditorAgentBicFi" => Ok(Self::CreditorAgentBicFi),
            "creditorAgentName" => Ok(Self::CreditorAgentName),
            "deliveryMode" => Ok(Self::DeliveryMode),
            other => Err(PlaygroundError::UnknownField(other.to_string())),
        }
    }
}

pub fn on_metadata_change(draft: &mut RequestDraft, field: MetadataField, value: &str) {
    let metadata = &mut draft.metadata;
    let slot = match field {
        MetadataField::CreditorAgentBicFi => &mut metadata.creditor_agent_bic_fi,
        MetadataField::CreditorAgentName => &mut metadata.creditor_agent_name,
        MetadataField::DeliveryMode => &mut metadata.delivery_mode,
    };
    *slot = value.to_string();
}

/// Point the draft at a bank, or clear the selection.
///
/// Credential values reset to one empty entry per credential field of the new
/// bank.
pub fn apply_bank_selection(draft: &mut RequestDraft, bank: Option<&Bank>) {
    draft.credential_fields.clear();
    match bank {
        Some(bank) => {
            draft.bank_id = bank.id.clone();
            draft.open_banking_standard = bank.open_banking_standard.clone().unwrap_or_default();
            for field in bank.credential_fields.iter().flatten() {
                draft.credential_fields.insert(field.id.clone(), String::new());
            }
        }
        None => {
            draft.bank_id.clear();
            draft.open_banking_standard.clear();
        }
    }
}
