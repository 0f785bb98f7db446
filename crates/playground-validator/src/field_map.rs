//! Static mapping from bank `mandatoryFields` names to draft inputs.
//!
//! Every name a bank can list resolves through `MANDATORY_FIELDS`; names not in
//! the table are ignored.

use serde::Serialize;
use playground_types::mandatory_fields::{self as names, polish_api, stet};
use playground_types::{Bank, RequestDraft};

/// A text input of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    BeneficiaryIban,
    BeneficiaryBic,
    AccountNumber,
    SortCode,
    BankgiroNumber,
    PlusgiroNumber,
    InstructionIdentification,
    Bban,
    ClearingNumber,
    CreditorLegalName,
    DebtorIban,
    DebtorBic,
    DebtorLegalName,
    AddressStreet,
    AddressHouseNumber,
    AddressPostCode,
    AddressCity,
    AddressCountry,
    AccessIban,
    AccessCurrency,
    CreditorAgentBicFi,
    CreditorAgentName,
    DeliveryMode,
}

impl DraftField {
    pub fn value(self, draft: &RequestDraft) -> &str {
        match self {
            Self::BeneficiaryIban => &draft.beneficiary_iban,
            Self::BeneficiaryBic => &draft.beneficiary_bic,
            Self::AccountNumber => &draft.account_number,
            Self::SortCode => &draft.sort_code,
            Self::BankgiroNumber => &draft.bankgiro_number,
            Self::PlusgiroNumber => &draft.plusgiro_number,
            Self::InstructionIdentification => &draft.instruction_identification,
            Self::Bban => &draft.bban,
            Self::ClearingNumber => &draft.clearing_number,
            Self::CreditorLegalName => &draft.creditor_legal_name,
            Self::DebtorIban => &draft.debtor_iban,
            Self::DebtorBic => &draft.debtor_bic,
            Self::DebtorLegalName => &draft.debtor_legal_name,
            Self::AddressStreet => &draft.address_street,
            Self::AddressHouseNumber => &draft.address_house_number,
            Self::AddressPostCode => &draft.address_post_code,
            Self::AddressCity => &draft.address_city,
            Self::AddressCountry => &draft.address_country,
            Self::AccessIban => &draft.access_iban,
            Self::AccessCurrency => &draft.access_currency,
            Self::CreditorAgentBicFi => &draft.metadata.creditor_agent_bic_fi,
            Self::CreditorAgentName => &draft.metadata.creditor_agent_name,
            Self::DeliveryMode => &draft.metadata.delivery_mode,
        }
    }

    pub fn is_filled(self, draft: &RequestDraft) -> bool {
        !self.value(draft).is_empty()
    }

    /// Form input name.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeneficiaryIban => "beneficiaryIban",
            Self::BeneficiaryBic => "beneficiaryBic",
            Self::AccountNumber => "accountNumber",
            Self::SortCode => "sortCode",
            Self::BankgiroNumber => "bankgiroNumber",
            Self::PlusgiroNumber => "plusgiroNumber",
            Self::InstructionIdentification => "instructionIdentification",
            Self::Bban => "bban",
            Self::ClearingNumber => "clearingNumber",
            Self::CreditorLegalName => "creditorLegalName",
            Self::DebtorIban => "debtorIban",
            Self::DebtorBic => "debtorBic",
            Self::DebtorLegalName => "debtorLegalName",
            Self::AddressStreet => "addressStreet",
            Self::AddressHouseNumber => "addressHouseNumber",
            Self::AddressPostCode => "addressPostCode",
            Self::AddressCity => "addressCity",
            Self::AddressCountry => "addressCountry",
            Self::AccessIban => "accessIban",
            Self::AccessCurrency => "accessCurrency",
            Self::CreditorAgentBicFi => "creditorAgentBicFi",
            Self::CreditorAgentName => "creditorAgentName",
            Self::DeliveryMode => "deliveryMode",
        }
    }
}

/// Which list of a bank's `mandatoryFields` a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldList {
    /// `transfer.domestic.fields`
    Domestic,
    /// `transfer.domestic.stetFields`
    Stet,
    /// `transfer.domestic.polishapiFields`
    PolishApi,
    /// `access.fields`
    Access,
}

impl FieldList {
    pub const TRANSFER: [FieldList; 3] = [Self::Domestic, Self::Stet, Self::PolishApi];

    pub fn names(self, bank: &Bank) -> &[String] {
        match self {
            Self::Domestic => bank.domestic_fields(),
            Self::Stet => bank.stet_fields(),
            Self::PolishApi => bank.polishapi_fields(),
            Self::Access => bank.access_fields(),
        }
    }
}

/// How an input behaves for web-app testers, where the hosted flow collects it.
///
/// Readiness never checks bank inputs for web-app testers, so none of them is
/// required there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebAppRule {
    Hidden,
    /// Still shown, but optional.
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MandatoryField {
    pub list: FieldList,
    pub name: &'static str,
    pub targets: &'static [DraftField],
    pub web_app: WebAppRule,
}

const fn entry(
    list: FieldList,
    name: &'static str,
    targets: &'static [DraftField],
    web_app: WebAppRule,
) -> MandatoryField {
    MandatoryField { list, name, targets, web_app }
}

pub static MANDATORY_FIELDS: &[MandatoryField] = &[
    entry(FieldList::Domestic, names::BBAN, &[DraftField::Bban], WebAppRule::Shown),
    entry(
        FieldList::Domestic,
        names::CLEARING_NUMBER,
        &[DraftField::ClearingNumber],
        WebAppRule::Shown,
    ),
    entry(
        FieldList::Domestic,
        names::CREDITOR_NAME,
        &[DraftField::CreditorLegalName],
        WebAppRule::Shown,
    ),
    entry(FieldList::Domestic, names::DEBTOR_ACCOUNT, &[DraftField::DebtorIban], WebAppRule::Hidden),
    entry(FieldList::Domestic, names::DEBTOR_BIC, &[DraftField::DebtorBic], WebAppRule::Hidden),
    entry(
        FieldList::Domestic,
        names::DEBTOR_NAME,
        &[DraftField::DebtorLegalName],
        WebAppRule::Hidden,
    ),
    entry(
        FieldList::Domestic,
        names::ADDRESS_STREET,
        &[DraftField::AddressStreet],
        WebAppRule::Hidden,
    ),
    entry(
        FieldList::Domestic,
        names::ADDRESS_HOUSE_NUMBER,
        &[DraftField::AddressHouseNumber],
        WebAppRule::Hidden,
    ),
    entry(
        FieldList::Domestic,
        names::ADDRESS_POST_CODE,
        &[DraftField::AddressPostCode],
        WebAppRule::Hidden,
    ),
    entry(FieldList::Domestic, names::ADDRESS_CITY, &[DraftField::AddressCity], WebAppRule::Hidden),
    entry(
        FieldList::Domestic,
        names::ADDRESS_COUNTRY,
        &[DraftField::AddressCountry],
        WebAppRule::Hidden,
    ),
    entry(
        FieldList::Stet,
        stet::CREDITOR_AGENT,
        &[DraftField::CreditorAgentBicFi, DraftField::CreditorAgentName],
        WebAppRule::Hidden,
    ),
    entry(
        FieldList::PolishApi,
        polish_api::DELIVERY_MODE,
        &[DraftField::DeliveryMode],
        WebAppRule::Hidden,
    ),
    entry(FieldList::Access, names::IBAN, &[DraftField::AccessIban], WebAppRule::Hidden),
    entry(FieldList::Access, names::CURRENCY, &[DraftField::AccessCurrency], WebAppRule::Hidden),
];

pub fn lookup(list: FieldList, name: &str) -> Option<&'static MandatoryField> {
    MANDATORY_FIELDS.iter().find(|field| field.list == list && field.name == name)
}

/// Table entries for the names a bank lists, in the bank's order.
pub fn listed(bank: &Bank, list: FieldList) -> impl Iterator<Item = &'static MandatoryField> + '_ {
    list.names(bank).iter().filter_map(move |name| lookup(list, name))
}

/// First listed field whose draft inputs are not all populated.
pub fn first_unmet(
    bank: &Bank,
    list: FieldList,
    draft: &RequestDraft,
) -> Option<&'static MandatoryField> {
    listed(bank, list).find(|field| field.targets.iter().any(|target| !target.is_filled(draft)))
}
