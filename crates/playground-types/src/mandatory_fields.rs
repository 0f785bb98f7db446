//! Field names a bank may list in its `mandatoryFields`.

pub const BBAN: &str = "bban";
pub const CLEARING_NUMBER: &str = "clearingNumber";
pub const CREDITOR_NAME: &str = "creditorName";
pub const DEBTOR_ACCOUNT: &str = "debtorAccount";
pub const DEBTOR_BIC: &str = "debtorBic";
pub const DEBTOR_NAME: &str = "debtorName";
pub const IBAN: &str = "iban";
pub const CURRENCY: &str = "currency";
pub const ADDRESS_STREET: &str = "addressStreet";
pub const ADDRESS_HOUSE_NUMBER: &str = "addressHouseNumber";
pub const ADDRESS_POST_CODE: &str = "addressPostCode";
pub const ADDRESS_CITY: &str = "addressCity";
pub const ADDRESS_COUNTRY: &str = "addressCountry";

/// Names listed under `stetFields`.
pub mod stet {
    pub const CREDITOR_AGENT: &str = "creditorAgent";
}

/// Names listed under `polishapiFields`.
pub mod polish_api {
    pub const DELIVERY_MODE: &str = "deliveryMode";
}
