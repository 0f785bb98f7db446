//! Bank metadata as returned by the bank directory.

use serde::{Deserialize, Serialize};

use crate::mandatory_fields;

/// A bank-specific credential input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialField {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Extra inputs a bank requires for domestic transfers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomesticMandatoryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stet_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polishapi_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMandatoryFields {
    #[serde(default)]
    pub domestic: DomesticMandatoryFields,
}

/// Extra inputs a bank requires for account access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMandatoryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandatoryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferMandatoryFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessMandatoryFields>,
}

/// Bank directory entry. Once chosen it becomes the selected bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_banking_standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_fields: Option<Vec<CredentialField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_fields: Option<MandatoryFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_time: Option<String>,
}

impl Bank {
    /// Display label: `name-identifier` when an identifier is present.
    pub fn label(&self) -> String {
        match &self.identifier {
            Some(identifier) => format!("{}-{}", self.name, identifier),
            None => self.name.clone(),
        }
    }

    pub fn domestic(&self) -> Option<&DomesticMandatoryFields> {
        self.mandatory_fields
            .as_ref()?
            .transfer
            .as_ref()
            .map(|transfer| &transfer.domestic)
    }

    pub fn access(&self) -> Option<&AccessMandatoryFields> {
        self.mandatory_fields.as_ref()?.access.as_ref()
    }

    pub fn domestic_fields(&self) -> &[String] {
        self.domestic().and_then(|d| d.fields.as_deref()).unwrap_or(&[])
    }

    pub fn stet_fields(&self) -> &[String] {
        self.domestic().and_then(|d| d.stet_fields.as_deref()).unwrap_or(&[])
    }

    pub fn polishapi_fields(&self) -> &[String] {
        self.domestic().and_then(|d| d.polishapi_fields.as_deref()).unwrap_or(&[])
    }

    pub fn access_fields(&self) -> &[String] {
        self.access().and_then(|a| a.fields.as_deref()).unwrap_or(&[])
    }

    /// A listed `bban` replaces the beneficiary IBAN for SEPA-style rails.
    pub fn accepts_bban(&self) -> bool {
        self.domestic_fields().iter().any(|f| f == mandatory_fields::BBAN)
    }
}
