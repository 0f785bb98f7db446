use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bank;
pub mod draft;
pub mod mandatory_fields;

pub use bank::{
    AccessMandatoryFields, Bank, CredentialField, DomesticMandatoryFields, MandatoryFields,
    TransferMandatoryFields,
};
pub use draft::{AccessScopes, RequestDraft, TransferMetadata};

/// Playground error types.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("{service} request failed: {message}")]
    Http { service: &'static str, message: String },

    #[error("{service} returned status {status}: {body}")]
    Status { service: &'static str, status: u16, body: String },

    #[error("failed to decode {service} response: {message}")]
    Decode { service: &'static str, message: String },

    #[error("invalid value for field `{field}`: expected {expected}")]
    InvalidFieldValue { field: String, expected: &'static str },

    #[error("unknown form field `{0}`")]
    UnknownField(String),

    #[error("session storage failure: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PlaygroundError>;

/// Kind of request the operator is configuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequestType {
    #[default]
    #[serde(rename = "accountServices")]
    AccountAccess,
    #[serde(rename = "singlePayment")]
    SinglePayment,
    #[serde(rename = "variableRecurringPayment")]
    VariableRecurringPayment,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountAccess => "accountServices",
            Self::SinglePayment => "singlePayment",
            Self::VariableRecurringPayment => "variableRecurringPayment",
        }
    }

    /// Single payments and VRP both go through the payment checks.
    pub fn is_payment(&self) -> bool {
        !matches!(self, Self::AccountAccess)
    }
}

impl FromStr for RequestType {
    type Err = PlaygroundError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "accountServices" => Ok(Self::AccountAccess),
            "singlePayment" => Ok(Self::SinglePayment),
            "variableRecurringPayment" => Ok(Self::VariableRecurringPayment),
            _ => Err(PlaygroundError::InvalidFieldValue {
                field: "requestType".into(),
                expected: "accountServices|singlePayment|variableRecurringPayment",
            }),
        }
    }
}

/// Payment rail a transfer is sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferDestination {
    Sepa,
    SepaInstant,
    Elixir,
    ExpressElixir,
    Sorbnet,
    BlueCash,
    BankGiro,
    PlusGiro,
    FasterPayments,
    Chaps,
    Bacs,
    EuDomesticNonEuro,
}

impl TransferDestination {
    pub const ALL: [TransferDestination; 12] = [
        Self::Sepa,
        Self::SepaInstant,
        Self::Elixir,
        Self::ExpressElixir,
        Self::Sorbnet,
        Self::BlueCash,
        Self::BankGiro,
        Self::PlusGiro,
        Self::FasterPayments,
        Self::Chaps,
        Self::Bacs,
        Self::EuDomesticNonEuro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sepa => "sepa",
            Self::SepaInstant => "sepaInstant",
            Self::Elixir => "elixir",
            Self::ExpressElixir => "expressElixir",
            Self::Sorbnet => "sorbnet",
            Self::BlueCash => "blueCash",
            Self::BankGiro => "bankGiro",
            Self::PlusGiro => "plusGiro",
            Self::FasterPayments => "fasterPayments",
            Self::Chaps => "chaps",
            Self::Bacs => "bacs",
            Self::EuDomesticNonEuro => "euDomesticNonEuro",
        }
    }
}

impl fmt::Display for TransferDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferDestination {
    type Err = PlaygroundError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rail| rail.as_str() == value)
            .ok_or_else(|| PlaygroundError::InvalidFieldValue {
                field: "transferDestination".into(),
                expected: "a known payment rail",
            })
    }
}

/// Sandbox member type derived from the tester id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Type1,
    Type2,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type1 => "type1",
            Self::Type2 => "type2",
        }
    }
}

impl FromStr for MemberType {
    type Err = PlaygroundError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "type1" => Ok(Self::Type1),
            "type2" => Ok(Self::Type2),
            _ => Err(PlaygroundError::InvalidFieldValue {
                field: "memberType".into(),
                expected: "type1|type2",
            }),
        }
    }
}

/// Account-access data toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessToggle {
    Accounts,
    Balance,
    Transactions,
}

impl AccessToggle {
    /// Resource type requested from the bank for this toggle.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Accounts => "ACCOUNTS",
            Self::Balance => "BALANCES",
            Self::Transactions => "TRANSACTIONS",
        }
    }
}

impl FromStr for AccessToggle {
    type Err = PlaygroundError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "accounts" => Ok(Self::Accounts),
            "balance" => Ok(Self::Balance),
            "transactions" => Ok(Self::Transactions),
            other => Err(PlaygroundError::UnknownField(other.to_string())),
        }
    }
}

/// Serde adapter mapping `Option<T>` to the empty string the form uses for "unset".
pub mod empty_as_none {
    use serde::de::value::StrDeserializer;
    use serde::de::{DeserializeOwned, IntoDeserializer};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => {
                let inner: StrDeserializer<'_, D::Error> = value.into_deserializer();
                T::deserialize(inner).map(Some)
            }
        }
    }
}
