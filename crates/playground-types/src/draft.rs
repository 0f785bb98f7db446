//! The in-progress request configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccessToggle, MemberType, RequestType, TransferDestination};

/// Account-access toggles. `accounts` is the umbrella flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessScopes {
    pub accounts: bool,
    pub balance: bool,
    pub transactions: bool,
}

impl Default for AccessScopes {
    fn default() -> Self {
        Self { accounts: true, balance: true, transactions: true }
    }
}

impl AccessScopes {
    pub fn get(&self, toggle: AccessToggle) -> bool {
        match toggle {
            AccessToggle::Accounts => self.accounts,
            AccessToggle::Balance => self.balance,
            AccessToggle::Transactions => self.transactions,
        }
    }

    pub fn set(&mut self, toggle: AccessToggle, checked: bool) {
        match toggle {
            AccessToggle::Accounts => self.accounts = checked,
            AccessToggle::Balance => self.balance = checked,
            AccessToggle::Transactions => self.transactions = checked,
        }
    }

    pub fn any(&self) -> bool {
        self.accounts || self.balance || self.transactions
    }

    pub fn enable_all(&mut self) {
        *self = Self::default();
    }
}

/// Rail-specific extras collected for STET and Polish API banks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferMetadata {
    pub creditor_agent_bic_fi: String,
    pub creditor_agent_name: String,
    pub delivery_mode: String,
}

/// Request draft as edited by the operator and posted as the token request `form`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestDraft {
    pub request_type: RequestType,
    #[serde(flatten)]
    pub scopes: AccessScopes,
    pub description: String,
    pub ref_id: String,
    pub amount: String,
    pub currency: String,
    pub country: String,
    pub tester_id: String,
    #[serde(with = "crate::empty_as_none")]
    pub transfer_destination: Option<TransferDestination>,
    pub bank_id: String,
    #[serde(with = "crate::empty_as_none")]
    pub member_type: Option<MemberType>,

    // Payee / payer
    pub beneficiary_iban: String,
    pub beneficiary_bic: String,
    pub account_number: String,
    pub sort_code: String,
    pub bankgiro_number: String,
    pub plusgiro_number: String,
    pub bban: String,
    pub clearing_number: String,
    pub instruction_identification: String,
    pub creditor_legal_name: String,
    pub debtor_legal_name: String,
    pub debtor_iban: String,
    pub debtor_bic: String,
    pub address_street: String,
    pub address_house_number: String,
    pub address_post_code: String,
    pub address_city: String,
    pub address_country: String,

    // Account-access mandatory fields
    pub access_iban: String,
    pub access_currency: String,

    pub metadata: TransferMetadata,
    pub credential_fields: BTreeMap<String, String>,
    pub open_banking_standard: String,
    pub customization_id: String,
    pub dev_key: String,

    pub web_app_enabled: bool,
    pub use_webapp_credentials_flow: bool,
    pub use_credential_flow: bool,
    pub tpp_callback: bool,
    pub return_refund_account: bool,
    pub disable_future_dated_payment_conversion: bool,

    /// Last resolved result of the external IBAN check.
    #[serde(skip)]
    pub is_iban_valid: bool,
}

impl Default for RequestDraft {
    fn default() -> Self {
        Self {
            request_type: RequestType::AccountAccess,
            scopes: AccessScopes::default(),
            description: String::new(),
            ref_id: String::new(),
            amount: "1".to_string(),
            currency: "EUR".to_string(),
            country: String::new(),
            tester_id: String::new(),
            transfer_destination: None,
            bank_id: String::new(),
            member_type: None,
            beneficiary_iban: String::new(),
            beneficiary_bic: String::new(),
            account_number: String::new(),
            sort_code: String::new(),
            bankgiro_number: String::new(),
            plusgiro_number: String::new(),
            bban: String::new(),
            clearing_number: String::new(),
            instruction_identification: String::new(),
            creditor_legal_name: String::new(),
            debtor_legal_name: String::new(),
            debtor_iban: String::new(),
            debtor_bic: String::new(),
            address_street: String::new(),
            address_house_number: String::new(),
            address_post_code: String::new(),
            address_city: String::new(),
            address_country: String::new(),
            access_iban: String::new(),
            access_currency: String::new(),
            metadata: TransferMetadata::default(),
            credential_fields: BTreeMap::new(),
            open_banking_standard: String::new(),
            customization_id: String::new(),
            dev_key: String::new(),
            web_app_enabled: true,
            use_webapp_credentials_flow: false,
            use_credential_flow: true,
            tpp_callback: false,
            return_refund_account: false,
            disable_future_dated_payment_conversion: true,
            is_iban_valid: false,
        }
    }
}

impl RequestDraft {
    /// Fresh draft preset to the first configured currency.
    pub fn new(default_currency: &str) -> Self {
        Self { currency: default_currency.to_string(), ..Self::default() }
    }
}
