//! Which optional inputs the form shows, and which of them are required.

use serde::Serialize;
use playground_config::PlaygroundSettings;
use playground_types::{Bank, RequestDraft, RequestType, TransferDestination};

use crate::field_map::{self, DraftField, FieldList, WebAppRule};
use crate::rails::{beneficiary_inputs, payment_methods};
use crate::tester::TesterWhitelist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRequirement {
    pub field: DraftField,
    pub required: bool,
}

impl FieldRequirement {
    fn new(field: DraftField, required: bool) -> Self {
        Self { field, required }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroups {
    pub bank_finder: bool,
    pub country_selector_enabled: bool,
    pub bank_selector_enabled: bool,
    pub vrp_available: bool,
    pub customization_id: bool,
    pub credential_flow_toggles: bool,
    pub payment_methods: Vec<TransferDestination>,
    pub beneficiary: Vec<FieldRequirement>,
    pub mandatory: Vec<FieldRequirement>,
    pub access: Vec<FieldRequirement>,
    /// Credential field ids to collect.
    pub credentials: Vec<String>,
    pub operational_time: Option<String>,
}

impl FieldGroups {
    /// Required inputs that are still empty, by form name.
    pub fn missing(&self, draft: &RequestDraft) -> Vec<String> {
        let inputs = self.beneficiary.iter().chain(&self.mandatory).chain(&self.access);
        let mut missing: Vec<String> = inputs
            .filter(|input| input.required && !input.field.is_filled(draft))
            .map(|input| input.field.name().to_string())
            .collect();
        missing.extend(
            self.credentials
                .iter()
                .filter(|id| draft.credential_fields.get(*id).map_or(true, String::is_empty))
                .cloned(),
        );
        missing
    }
}

/// Token environment in which VRP is offered.
pub const VRP_TOKEN_ENV: &str = "dev";

/// Session facts the groups depend on besides the draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupContext<'a> {
    /// Crowd-sourced sessions hide the customization id.
    pub crowd_source: bool,
    /// Sandbox environment name, once loaded.
    pub token_env: Option<&'a str>,
}

/// Compute the optional inputs for the draft's current state.
pub fn required_field_groups(
    draft: &RequestDraft,
    bank: Option<&Bank>,
    settings: &PlaygroundSettings,
    context: GroupContext<'_>,
) -> FieldGroups {
    let vrp = draft.request_type == RequestType::VariableRecurringPayment;
    let single = draft.request_type == RequestType::SinglePayment;
    let web_app = draft.web_app_enabled;

    let mut groups = FieldGroups {
        bank_finder: !vrp,
        country_selector_enabled: draft.currency == "EUR"
            && settings.is_whitelisted(&draft.tester_id),
        bank_selector_enabled: !draft.country.is_empty(),
        vrp_available: settings.is_vrp_tester(&draft.tester_id)
            && context.token_env == Some(VRP_TOKEN_ENV),
        customization_id: !context.crowd_source && !vrp,
        credential_flow_toggles: !vrp && draft.tester_id.to_lowercase().contains("callback"),
        ..FieldGroups::default()
    };

    if draft.request_type.is_payment() {
        groups.payment_methods = payment_methods(&draft.currency).to_vec();
    }

    if single {
        if let Some(rail) = draft.transfer_destination {
            groups.beneficiary = beneficiary_inputs(rail, bank)
                .into_iter()
                .map(|(field, required)| FieldRequirement::new(field, required))
                .collect();
        }
    }

    let Some(bank) = bank else {
        return groups;
    };

    if single && bank.mandatory_fields.is_some() {
        for list in FieldList::TRANSFER {
            for entry in field_map::listed(bank, list) {
                let required = match (web_app, entry.web_app) {
                    (false, _) => true,
                    (true, WebAppRule::Hidden) => continue,
                    (true, WebAppRule::Shown) => false,
                };
                groups
                    .mandatory
                    .extend(entry.targets.iter().map(|field| FieldRequirement::new(*field, required)));
            }
        }
    }

    if draft.request_type == RequestType::AccountAccess && !web_app {
        groups.access = field_map::listed(bank, FieldList::Access)
            .flat_map(|entry| entry.targets.iter())
            .map(|field| FieldRequirement::new(*field, true))
            .collect();
    }

    if !vrp && !web_app && !draft.use_webapp_credentials_flow {
        groups.credentials =
            bank.credential_fields.iter().flatten().map(|field| field.id.clone()).collect();
    }

    if single {
        groups.operational_time = bank.operational_time.clone();
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dev() -> GroupContext<'static> {
        GroupContext { crowd_source: false, token_env: Some("dev") }
    }

    fn stet_bank() -> Bank {
        serde_json::from_value(json!({
            "id": "ngp-bnp",
            "name": "BNP",
            "operationalTime": "Mon-Fri 8:00-18:00",
            "credentialFields": [{ "id": "username", "displayName": "Username" }],
            "mandatoryFields": {
                "transfer": { "domestic": {
                    "fields": ["creditorName", "debtorAccount", "bban"],
                    "stetFields": ["creditorAgent"]
                } },
                "access": { "fields": ["iban", "currency"] }
            }
        }))
        .unwrap()
    }

    fn payment_draft() -> RequestDraft {
        let mut draft = RequestDraft::default();
        draft.request_type = RequestType::SinglePayment;
        draft.transfer_destination = Some(TransferDestination::Sepa);
        draft.tester_id = "Type2Token".into();
        draft.web_app_enabled = false;
        draft.country = "FR".into();
        draft
    }

    fn names(inputs: &[FieldRequirement]) -> Vec<(&'static str, bool)> {
        inputs.iter().map(|input| (input.field.name(), input.required)).collect()
    }

    #[test]
    fn api_tester_sees_all_bank_inputs() {
        let settings = PlaygroundSettings::default();
        let bank = stet_bank();
        let groups = required_field_groups(&payment_draft(), Some(&bank), &settings, dev());

        assert_eq!(
            names(&groups.beneficiary),
            [("beneficiaryIban", false), ("beneficiaryBic", false)]
        );
        assert_eq!(
            names(&groups.mandatory),
            [
                ("creditorLegalName", true),
                ("debtorIban", true),
                ("bban", true),
                ("creditorAgentBicFi", true),
                ("creditorAgentName", true),
            ]
        );
        assert_eq!(groups.credentials, ["username"]);
        assert_eq!(groups.operational_time.as_deref(), Some("Mon-Fri 8:00-18:00"));
        assert!(groups.access.is_empty());
        assert!(groups.country_selector_enabled);
        assert!(groups.bank_selector_enabled);
        assert!(groups.customization_id);
    }

    #[test]
    fn web_app_tester_keeps_creditor_name_optional() {
        let settings = PlaygroundSettings::default();
        let bank = stet_bank();
        let mut draft = payment_draft();
        draft.web_app_enabled = true;

        let groups = required_field_groups(&draft, Some(&bank), &settings, dev());
        assert_eq!(names(&groups.mandatory), [("creditorLegalName", false), ("bban", false)]);
        assert!(groups.credentials.is_empty());
    }

    #[test]
    fn ready_web_app_draft_has_nothing_missing() {
        let settings = PlaygroundSettings::default();
        let bank: Bank = serde_json::from_value(json!({
            "id": "ngp-seb",
            "name": "SEB",
            "mandatoryFields": {
                "transfer": { "domestic": { "fields": ["bban", "clearingNumber"] } }
            }
        }))
        .unwrap();
        let mut draft = RequestDraft::default();
        draft.request_type = RequestType::SinglePayment;
        draft.currency = "SEK".into();
        draft.transfer_destination = Some(TransferDestination::EuDomesticNonEuro);
        draft.tester_id = "Token".into();
        draft.bank_id = bank.id.clone();
        assert!(draft.web_app_enabled);

        assert!(crate::is_submittable(&draft, Some(&bank), &settings));
        let groups = required_field_groups(&draft, Some(&bank), &settings, dev());
        assert_eq!(names(&groups.mandatory), [("bban", false), ("clearingNumber", false)]);
        assert!(groups.missing(&draft).is_empty());

        draft.web_app_enabled = false;
        assert!(!crate::is_submittable(&draft, Some(&bank), &settings));
        let groups = required_field_groups(&draft, Some(&bank), &settings, dev());
        assert_eq!(groups.missing(&draft), ["bban", "clearingNumber"]);
    }

    #[test]
    fn account_access_shows_access_inputs() {
        let settings = PlaygroundSettings::default();
        let bank = stet_bank();
        let mut draft = payment_draft();
        draft.request_type = RequestType::AccountAccess;

        let context = GroupContext { crowd_source: true, ..dev() };
        let groups = required_field_groups(&draft, Some(&bank), &settings, context);
        assert_eq!(names(&groups.access), [("accessIban", true), ("accessCurrency", true)]);
        assert!(groups.mandatory.is_empty());
        assert!(groups.payment_methods.is_empty());
        assert!(groups.operational_time.is_none());
        assert!(!groups.customization_id);
    }

    #[test]
    fn vrp_hides_finder_and_credentials() {
        let settings = PlaygroundSettings::default();
        let bank = stet_bank();
        let mut draft = payment_draft();
        draft.request_type = RequestType::VariableRecurringPayment;
        draft.tester_id = "type2tppcallback".into();

        let groups = required_field_groups(&draft, Some(&bank), &settings, dev());
        assert!(!groups.bank_finder);
        assert!(groups.vrp_available);
        assert!(!groups.credential_flow_toggles);
        assert!(!groups.customization_id);
        assert!(groups.credentials.is_empty());
        assert!(groups.beneficiary.is_empty());
        assert_eq!(groups.payment_methods, [TransferDestination::Sepa, TransferDestination::SepaInstant]);
    }

    #[test]
    fn vrp_is_only_offered_in_dev() {
        let settings = PlaygroundSettings::default();
        let mut draft = payment_draft();
        draft.tester_id = "type2tppcallback".into();

        let sandbox = GroupContext { token_env: Some("sandbox"), ..dev() };
        assert!(!required_field_groups(&draft, None, &settings, sandbox).vrp_available);
        assert!(!required_field_groups(&draft, None, &settings, GroupContext::default()).vrp_available);
        assert!(required_field_groups(&draft, None, &settings, dev()).vrp_available);
    }

    #[test]
    fn callback_testers_get_flow_toggles() {
        let settings = PlaygroundSettings::default();
        let mut draft = payment_draft();
        draft.tester_id = "Type2TokenCallback".into();
        let groups = required_field_groups(&draft, None, &settings, dev());
        assert!(groups.credential_flow_toggles);
        assert!(!groups.vrp_available);
    }

    #[test]
    fn country_selector_requires_eur_and_whitelisted_tester() {
        let settings = PlaygroundSettings::default();
        let mut draft = payment_draft();
        draft.currency = "GBP".into();
        assert!(!required_field_groups(&draft, None, &settings, dev()).country_selector_enabled);

        draft.currency = "EUR".into();
        draft.tester_id = "nobody".into();
        assert!(!required_field_groups(&draft, None, &settings, dev()).country_selector_enabled);
    }

    #[test]
    fn missing_lists_empty_required_inputs() {
        let settings = PlaygroundSettings::default();
        let bank = stet_bank();
        let mut draft = payment_draft();
        draft.creditor_legal_name = "Alice".into();
        draft.bban = "12345".into();
        draft.metadata.creditor_agent_bic_fi = "AGNTFRPP".into();
        draft.metadata.creditor_agent_name = "Agent".into();
        draft.credential_fields.insert("username".into(), String::new());

        let groups = required_field_groups(&draft, Some(&bank), &settings, dev());
        assert_eq!(groups.missing(&draft), ["debtorIban", "username"]);

        draft.debtor_iban = "FR76".into();
        draft.credential_fields.insert("username".into(), "alice".into());
        assert!(groups.missing(&draft).is_empty());
    }
}
