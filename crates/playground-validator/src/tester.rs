//! Tester whitelist and the profile a tester id implies.

use serde::{Deserialize, Serialize};
use playground_config::PlaygroundSettings;
use playground_types::{MemberType, RequestDraft};

/// Decides whether a tester id may submit requests.
pub trait TesterWhitelist {
    fn is_whitelisted(&self, tester_id: &str) -> bool;
}

impl TesterWhitelist for PlaygroundSettings {
    fn is_whitelisted(&self, tester_id: &str) -> bool {
        self.is_tester_whitelisted(tester_id)
    }
}

/// Settings derived from a whitelisted tester id, persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesterProfile {
    pub tester_id: String,
    pub member_type: MemberType,
    pub web_app_enabled: bool,
    pub tpp_callback: bool,
    /// VRP consent is collected through the hosted web app.
    pub vrp_web_app: bool,
}

impl TesterProfile {
    pub fn from_tester_id(tester_id: &str) -> Self {
        let lower = tester_id.to_lowercase();
        let (member_type, web_app_enabled, tpp_callback) = if lower.contains("type2") {
            (MemberType::Type2, lower.contains("webapp"), lower.contains("tpp"))
        } else {
            (MemberType::Type1, true, false)
        };
        Self {
            tester_id: tester_id.to_string(),
            member_type,
            web_app_enabled,
            tpp_callback,
            vrp_web_app: lower == "type2tppcallbackwebapp",
        }
    }

    pub fn apply(&self, draft: &mut RequestDraft) {
        draft.member_type = Some(self.member_type);
        draft.web_app_enabled = self.web_app_enabled;
        if self.member_type == MemberType::Type2 {
            draft.tpp_callback = self.tpp_callback;
        }
    }
}

/// Reconfigure the draft for its tester id. `None` when the id is not whitelisted,
/// in which case the draft keeps its previous profile.
pub fn configure_tester(draft: &mut RequestDraft, settings: &PlaygroundSettings) -> Option<TesterProfile> {
    if !settings.is_whitelisted(&draft.tester_id) {
        return None;
    }
    let profile = TesterProfile::from_tester_id(&draft.tester_id);
    profile.apply(draft);
    Some(profile)
}

/// Refresh the customization id for the current tester and request type.
pub fn apply_customization_id(draft: &mut RequestDraft, settings: &PlaygroundSettings) {
    draft.customization_id = settings
        .customization_id(&draft.tester_id, draft.request_type.as_str())
        .unwrap_or_default()
        .to_string();
}
