//! Token request builder and sandbox client.
//!
//! - Build the token request body from a draft and the selected bank
//! - Post it to the playground server
//! - Validate IBANs and read the sandbox environment name

use serde::Serialize;
use uuid::Uuid;
use playground_types::{AccessMandatoryFields, Bank, DomesticMandatoryFields, RequestDraft, RequestType};

pub mod sandbox_client;

pub use sandbox_client::SandboxClient;

/// Bank requirements forwarded with the request so the server can map them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MandatoryFieldsPayload {
    Domestic(DomesticMandatoryFields),
    Access(AccessMandatoryFields),
}

/// Client metadata attached to every token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeaders {
    pub json_error: bool,
    pub device_id: Uuid,
    pub user_agent: String,
}

impl RequestHeaders {
    /// Fresh headers with a random device id.
    pub fn new(user_agent: &str) -> Self {
        Self { json_error: true, device_id: Uuid::new_v4(), user_agent: user_agent.to_string() }
    }
}

/// Body of `POST {page_path}/request-token`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub form: &'a RequestDraft,
    pub mandatory_fields: Option<MandatoryFieldsPayload>,
    pub headers: RequestHeaders,
}

impl<'a> TokenRequest<'a> {
    /// Single payments carry the bank's domestic transfer block, everything
    /// else its access block.
    pub fn build(form: &'a RequestDraft, bank: Option<&Bank>, user_agent: &str) -> Self {
        let mandatory_fields = bank.and_then(|bank| match form.request_type {
            RequestType::SinglePayment => bank.domestic().cloned().map(MandatoryFieldsPayload::Domestic),
            _ => bank.access().cloned().map(MandatoryFieldsPayload::Access),
        });
        Self { form, mandatory_fields, headers: RequestHeaders::new(user_agent) }
    }
}
