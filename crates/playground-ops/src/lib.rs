//! Playground session orchestration.
//!
//! Owns the draft, the selected bank and the service clients, applies the
//! validator's field-change rules and carries out the side effects they
//! request: persisting the tester profile, reloading banks for a new country.
//! Lookups that fail are logged and degraded so the form stays usable; only a
//! failed submission is reported to the caller.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use playground_config::{ApiConfig, AppConfig, Country, PlaygroundSettings};
use playground_directory::{BankDirectory, DirectoryEventHandler, TesterQuery};
use playground_store::{SessionKey, SessionStore};
use playground_submit::{SandboxClient, TokenRequest};
use playground_types::{AccessToggle, Bank, PlaygroundError, RequestDraft, Result};
use playground_validator::{
    apply_bank_selection, default_transfer_destination, evaluate, iban_message,
    on_account_toggle, on_field_change, on_metadata_change, required_field_groups,
    select_country, tester_id_message, FieldChangeOutcome, FieldGroups, FieldValue, FormField,
    GroupContext, MetadataField, SideEffect, Submittability, TesterProfile,
};

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect()
}

/// Fresh reference id: `REFTEST` and nine random base-36 characters.
pub fn generate_ref_id() -> String {
    format!("REFTEST{}", random_base36(9))
}

/// Fresh description: `DESC` and eight random base-36 characters.
pub fn generate_description() -> String {
    format!("DESC{}", random_base36(8))
}

/// Prefill for the support ticket form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub ref_id: Option<String>,
    pub bank_id: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
}

/// One operator's playground session.
pub struct PlaygroundSession {
    api: ApiConfig,
    settings: PlaygroundSettings,
    store: Arc<dyn SessionStore>,
    directory: BankDirectory,
    sandbox: SandboxClient,
    draft: RequestDraft,
    selected_bank: Option<Bank>,
    vrp_web_app: bool,
    env: Option<String>,
    last_error: Option<String>,
}

impl PlaygroundSession {
    pub fn new(config: &AppConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::with_events(config, store, None)
    }

    pub fn with_events(
        config: &AppConfig,
        store: Arc<dyn SessionStore>,
        on_event: Option<DirectoryEventHandler>,
    ) -> Self {
        let api = config.api.clone();
        Self {
            directory: BankDirectory::new(&api, on_event),
            sandbox: SandboxClient::new(&api.app_url, api.page_path(), Some(api.request_timeout_ms)),
            draft: RequestDraft::new(config.playground.default_currency()),
            settings: config.playground.clone(),
            api,
            store,
            selected_bank: None,
            vrp_web_app: false,
            env: None,
            last_error: None,
        }
    }

    /// Open the session: fresh generated values, the stored tester re-applied,
    /// then the environment name and tester info loaded.
    pub async fn restore(&mut self) -> Result<()> {
        self.generate_values();
        let stored = self.store.get(SessionKey::TesterId).await?;
        if let Some(tester_id) = stored.filter(|id| !id.is_empty()) {
            tracing::debug!(%tester_id, "restoring stored tester");
            self.change_form(FormField::TesterId, FieldValue::Text(tester_id)).await?;
        }
        self.load_token_env().await;
        self.load_tester_info().await
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn selected_bank(&self) -> Option<&Bank> {
        self.selected_bank.as_ref()
    }

    pub fn banks(&self) -> &[Bank] {
        self.directory.banks()
    }

    pub fn countries(&self) -> &[Country] {
        self.directory.countries()
    }

    pub fn member_id(&self) -> Option<&str> {
        self.directory.member_id()
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// VRP consent for this tester goes through the hosted web app.
    pub fn vrp_web_app(&self) -> bool {
        self.vrp_web_app
    }

    pub fn settings(&self) -> &PlaygroundSettings {
        &self.settings
    }

    /// Edit a form input and carry out whatever the change implies.
    pub async fn change_form(&mut self, field: FormField, value: FieldValue) -> Result<()> {
        let outcome = on_field_change(&mut self.draft, field, value, &self.settings)?;
        self.apply(outcome).await
    }

    pub fn change_metadata(&mut self, field: MetadataField, value: &str) {
        on_metadata_change(&mut self.draft, field, value);
    }

    pub fn change_credential_field(&mut self, id: &str, value: &str) {
        self.draft.credential_fields.insert(id.to_string(), value.to_string());
    }

    pub fn toggle_access(&mut self, toggle: AccessToggle, checked: bool) {
        on_account_toggle(&mut self.draft, toggle, checked);
    }

    /// Switch country, dropping the bank selection and reloading the bank list.
    pub async fn change_country(&mut self, country: &str) -> Result<()> {
        let outcome = select_country(&mut self.draft, country, &self.settings);
        self.apply(outcome).await
    }

    async fn apply(&mut self, outcome: FieldChangeOutcome) -> Result<()> {
        for effect in outcome.effects {
            match effect {
                SideEffect::PersistTester(profile) => self.persist_tester(&profile).await?,
                SideEffect::CountryChanged { country } => self.reload_banks(&country).await,
            }
        }
        if let Some(rail) = default_transfer_destination(&self.draft) {
            self.draft.transfer_destination = Some(rail);
        }
        Ok(())
    }

    async fn persist_tester(&mut self, profile: &TesterProfile) -> Result<()> {
        self.store.set(SessionKey::TesterId, &profile.tester_id).await?;
        self.store.set(SessionKey::MemberType, profile.member_type.as_str()).await?;
        self.store
            .set(SessionKey::WebAppEnabled, &self.draft.web_app_enabled.to_string())
            .await?;
        self.store
            .set(SessionKey::TppCallback, &self.draft.tpp_callback.to_string())
            .await?;
        self.vrp_web_app = profile.vrp_web_app;
        Ok(())
    }

    async fn reload_banks(&mut self, country: &str) {
        self.selected_bank = None;
        self.draft.credential_fields.clear();
        match self.directory.load_country(country, &self.draft.dev_key).await {
            Ok(banks) => tracing::debug!(country, count = banks.len(), "bank list reloaded"),
            Err(e) => tracing::warn!(country, error = %e, "bank list unavailable"),
        }
    }

    /// Narrow the bank list by name. Empty queries are ignored.
    pub async fn search_banks(&mut self, query: &str) {
        let country = self.draft.country.clone();
        if let Err(e) = self.directory.search(&country, query, &self.draft.dev_key).await {
            tracing::warn!(%country, query, error = %e, "bank search failed");
        }
    }

    /// Select a bank, or clear the selection with `None`.
    pub async fn select_bank(&mut self, bank: Option<Bank>) -> Result<()> {
        apply_bank_selection(&mut self.draft, bank.as_ref());
        if let Some(bank) = &bank {
            self.store.set(SessionKey::BankId, &bank.id).await?;
            tracing::debug!(bank_id = %bank.id, "bank selected");
        }
        self.selected_bank = bank;
        Ok(())
    }

    /// Select a bank from the loaded list by id. Returns whether it was found.
    pub async fn select_bank_by_id(&mut self, id: &str) -> Result<bool> {
        let bank = self.directory.bank(id).cloned();
        let found = bank.is_some();
        if found {
            self.select_bank(bank).await?;
        }
        Ok(found)
    }

    /// Check the beneficiary IBAN with the server. Returns the field message,
    /// if any. The draft keeps whichever answer arrived last.
    pub async fn validate_iban(&mut self) -> Option<&'static str> {
        self.draft.is_iban_valid = false;
        let iban = self.draft.beneficiary_iban.clone();
        self.draft.is_iban_valid = match self.sandbox.validate_iban(&iban).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "iban validation unavailable");
                false
            }
        };
        iban_message(&self.draft)
    }

    /// Check the tester id against the whitelist, loading tester info when it passes.
    pub async fn validate_tester_id(&mut self) -> Result<Option<&'static str>> {
        if let Some(message) = tester_id_message(&self.draft.tester_id, &self.settings) {
            return Ok(Some(message));
        }
        self.load_tester_info().await?;
        Ok(None)
    }

    /// Resolve the stored tester's member and country list.
    pub async fn load_tester_info(&mut self) -> Result<()> {
        let snapshot = self.store.snapshot().await?;
        let Some(tester_id) = snapshot.tester_id.filter(|id| !id.is_empty()) else {
            tracing::debug!("no stored tester, skipping tester lookup");
            return Ok(());
        };
        let query = TesterQuery {
            tester_id: &tester_id,
            member_type: snapshot.member_type.as_deref().and_then(|m| m.parse().ok()),
            tpp_callback: snapshot.tpp_callback.as_deref() == Some("true"),
        };
        if let Err(e) = self.directory.load_tester(query, &self.settings.countries).await {
            tracing::warn!(%tester_id, error = %e, "tester lookup failed");
        }
        Ok(())
    }

    pub async fn load_token_env(&mut self) {
        match self.sandbox.token_env().await {
            Ok(env) => self.env = Some(env),
            Err(e) => tracing::warn!(error = %e, "token env unavailable"),
        }
    }

    pub fn generate_values(&mut self) {
        self.draft.ref_id = generate_ref_id();
        self.draft.description = generate_description();
    }

    pub fn evaluate(&self) -> Submittability {
        evaluate(&self.draft, self.selected_bank.as_ref(), &self.settings)
    }

    pub fn is_form_filled(&self) -> bool {
        self.evaluate().is_ready()
    }

    pub fn field_groups(&self) -> FieldGroups {
        required_field_groups(
            &self.draft,
            self.selected_bank.as_ref(),
            &self.settings,
            GroupContext { crowd_source: self.api.crowd_source, token_env: self.env.as_deref() },
        )
    }

    /// Post the token request. A failure is kept for the support ticket.
    pub async fn submit(&mut self) -> Result<Option<Value>> {
        if let Submittability::Blocked(blocker) = self.evaluate() {
            return Err(PlaygroundError::Other(format!("request is not ready: {blocker}")));
        }

        self.store.set(SessionKey::TesterId, &self.draft.tester_id).await?;
        self.store.set(SessionKey::RefId, &self.draft.ref_id).await?;
        self.store.set(SessionKey::Description, &self.draft.description).await?;

        let reply = {
            let request =
                TokenRequest::build(&self.draft, self.selected_bank.as_ref(), &self.api.user_agent);
            self.sandbox.request_token(&request).await
        };
        match reply {
            Ok(reply) => {
                tracing::info!(
                    ref_id = %self.draft.ref_id,
                    bank_id = %self.draft.bank_id,
                    request_type = self.draft.request_type.as_str(),
                    "token request submitted"
                );
                self.last_error = None;
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(ref_id = %self.draft.ref_id, error = %e, "token request failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Prefill for a support ticket from the last submission, then roll new values.
    pub async fn support_ticket(&mut self) -> Result<SupportTicket> {
        let snapshot = self.store.snapshot().await?;
        let ticket = SupportTicket {
            ref_id: snapshot.ref_id,
            bank_id: snapshot.bank_id,
            description: snapshot.description,
            error: self.last_error.clone(),
        };
        self.generate_values();
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_store::memory::MemoryStore;
    use playground_types::{MemberType, RequestType, TransferDestination};
    use playground_validator::Blocker;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.api.app_url = server.uri();
        config.api.api_url = format!("{}/tokenApi", server.uri());
        config.api.request_timeout_ms = 2_000;
        config
    }

    fn bank_list() -> Value {
        json!({
            "banks": [
                {
                    "id": "ngp-pko",
                    "name": "PKO",
                    "country": "PL",
                    "credentialFields": [{ "id": "login", "displayName": "Login" }]
                },
                { "id": "ngp-mbank", "name": "mBank", "country": "PL" }
            ]
        })
    }

    async fn mount_services(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/playground/token-env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("dev"))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/testerId-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memberId": "m:1",
                "countryCodeList": ["PL", "GB", "DE"]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tokenApi/banks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bank_list()))
            .mount(server)
            .await;
    }

    async fn session(server: &MockServer) -> (PlaygroundSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = PlaygroundSession::new(&config(server), store.clone());
        (session, store)
    }

    async fn text(session: &mut PlaygroundSession, field: &str, value: &str) {
        session.change_form(field.parse().unwrap(), value.into()).await.unwrap();
    }

    #[test]
    fn generated_values_have_expected_shape() {
        let ref_id = generate_ref_id();
        assert_eq!(ref_id.len(), 16);
        assert!(ref_id.starts_with("REFTEST"));
        let description = generate_description();
        assert_eq!(description.len(), 12);
        assert!(description.starts_with("DESC"));
        assert!(description[4..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn restore_reapplies_stored_tester() {
        let server = MockServer::start().await;
        mount_services(&server).await;
        Mock::given(method("GET"))
            .and(path("/testerId-info"))
            .and(query_param("testerId", "Type2Token"))
            .and(query_param("memberType", "type2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memberId": "m:2",
                "countryCodeList": ["DE", "PL"]
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        let (mut session, store) = session(&server).await;
        store.set(SessionKey::TesterId, "Type2Token").await.unwrap();

        session.restore().await.unwrap();

        let draft = session.draft();
        assert_eq!(draft.tester_id, "Type2Token");
        assert_eq!(draft.member_type, Some(MemberType::Type2));
        assert!(!draft.web_app_enabled);
        assert!(draft.ref_id.starts_with("REFTEST"));
        assert!(draft.description.starts_with("DESC"));
        assert_eq!(session.env(), Some("dev"));
        assert_eq!(session.member_id(), Some("m:2"));
        let names: Vec<_> = session.countries().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Germany", "Poland"]);
        assert_eq!(store.get(SessionKey::MemberType).await.unwrap().as_deref(), Some("type2"));
    }

    #[tokio::test]
    async fn restore_without_services_degrades() {
        let server = MockServer::start().await;
        let (mut session, store) = session(&server).await;
        store.set(SessionKey::TesterId, "Token").await.unwrap();

        session.restore().await.unwrap();

        assert_eq!(session.env(), None);
        assert!(session.countries().is_empty());
        assert_eq!(session.draft().tester_id, "Token");
    }

    #[tokio::test]
    async fn currency_change_reloads_banks_and_picks_first_rail() {
        let server = MockServer::start().await;
        mount_services(&server).await;
        let (mut session, _store) = session(&server).await;

        text(&mut session, "testerId", "Token").await;
        session.load_tester_info().await.unwrap();
        text(&mut session, "requestType", "singlePayment").await;
        assert_eq!(session.draft().transfer_destination, Some(TransferDestination::Sepa));

        text(&mut session, "currency", "PLN").await;

        let draft = session.draft();
        assert_eq!(draft.country, "PL");
        assert!(draft.bank_id.is_empty());
        assert_eq!(draft.transfer_destination, Some(TransferDestination::Elixir));
        assert_eq!(session.banks().len(), 2);
        assert!(session.selected_bank().is_none());
    }

    #[tokio::test]
    async fn selecting_a_bank_resets_credentials_and_persists_id() {
        let server = MockServer::start().await;
        mount_services(&server).await;
        let (mut session, store) = session(&server).await;

        text(&mut session, "testerId", "Token").await;
        session.load_tester_info().await.unwrap();
        session.change_country("PL").await.unwrap();

        assert!(session.select_bank_by_id("ngp-pko").await.unwrap());
        assert!(!session.select_bank_by_id("missing").await.unwrap());
        assert_eq!(session.draft().bank_id, "ngp-pko");
        assert_eq!(session.draft().credential_fields.get("login").map(String::as_str), Some(""));
        assert_eq!(store.get(SessionKey::BankId).await.unwrap().as_deref(), Some("ngp-pko"));

        session.select_bank(None).await.unwrap();
        assert!(session.draft().bank_id.is_empty());
        assert!(session.draft().credential_fields.is_empty());
    }

    #[tokio::test]
    async fn iban_validation_sets_flag_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/playground/validate-iban"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/playground/validate-iban"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;
        let (mut session, _store) = session(&server).await;
        text(&mut session, "beneficiaryIban", "de89370400440532013000").await;

        assert_eq!(session.validate_iban().await, None);
        assert!(session.draft().is_iban_valid);

        assert_eq!(session.validate_iban().await, Some("Invalid Iban"));
        assert!(!session.draft().is_iban_valid);
    }

    #[tokio::test]
    async fn unknown_tester_gets_field_message() {
        let server = MockServer::start().await;
        let (mut session, _store) = session(&server).await;
        text(&mut session, "testerId", "intruder").await;
        assert_eq!(session.validate_tester_id().await.unwrap(), Some("Invalid Tester Id"));
    }

    #[tokio::test]
    async fn gbp_payment_end_to_end() {
        let server = MockServer::start().await;
        mount_services(&server).await;
        Mock::given(method("POST"))
            .and(path("/playground/request-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("https://web-app.test/r/1")))
            .expect(1)
            .mount(&server)
            .await;
        let (mut session, store) = session(&server).await;

        text(&mut session, "testerId", "Token").await;
        session.load_tester_info().await.unwrap();
        text(&mut session, "requestType", "singlePayment").await;
        text(&mut session, "currency", "GBP").await;
        assert_eq!(session.draft().transfer_destination, Some(TransferDestination::FasterPayments));
        session.select_bank_by_id("ngp-mbank").await.unwrap();
        assert!(!session.is_form_filled());

        text(&mut session, "sortCode", "123456").await;
        text(&mut session, "accountNumber", "12345678").await;
        assert!(session.is_form_filled());
        assert_eq!(session.draft().request_type, RequestType::SinglePayment);

        let reply = session.submit().await.unwrap();
        assert_eq!(reply, Some(json!("https://web-app.test/r/1")));
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.tester_id.as_deref(), Some("Token"));
        assert_eq!(snapshot.ref_id.as_deref(), Some(session.draft().ref_id.as_str()));
    }

    #[tokio::test]
    async fn incomplete_draft_is_not_submitted() {
        let server = MockServer::start().await;
        let (mut session, _store) = session(&server).await;
        assert_eq!(
            session.evaluate().blocker(),
            Some(&Blocker::InvalidTesterId)
        );
        let err = session.submit().await.unwrap_err();
        assert!(err.to_string().contains("not ready"));
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_submission_feeds_support_ticket() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/playground/request-token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
            .mount(&server)
            .await;
        let (mut session, store) = session(&server).await;
        text(&mut session, "testerId", "Token").await;
        session.generate_values();
        session.draft.bank_id = "ngp-bnp".into();
        store.set(SessionKey::BankId, "ngp-bnp").await.unwrap();
        let submitted_ref = session.draft().ref_id.clone();

        assert!(session.submit().await.is_err());
        assert_eq!(
            session.last_error(),
            Some("token request returned status 400: Bad Request")
        );

        let ticket = session.support_ticket().await.unwrap();
        assert_eq!(ticket.ref_id.as_deref(), Some(submitted_ref.as_str()));
        assert_eq!(ticket.bank_id.as_deref(), Some("ngp-bnp"));
        assert_eq!(ticket.error.as_deref(), Some("token request returned status 400: Bad Request"));
        assert_ne!(session.draft().ref_id, submitted_ref);
    }

    #[tokio::test]
    async fn vrp_web_app_follows_tester() {
        let server = MockServer::start().await;
        let (mut session, _store) = session(&server).await;
        text(&mut session, "testerId", "type2tppcallbackwebapp").await;
        assert!(session.vrp_web_app());
        text(&mut session, "testerId", "type2tppcallback").await;
        assert!(!session.vrp_web_app());
    }

    #[tokio::test]
    async fn field_groups_reflect_crowd_source() {
        let server = MockServer::start().await;
        let mut config = config(&server);
        config.api.crowd_source = true;
        let session = PlaygroundSession::new(&config, Arc::new(MemoryStore::new()));
        assert!(!session.field_groups().customization_id);
    }

    #[tokio::test]
    async fn vrp_follows_loaded_token_env() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playground/token-env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("dev"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playground/token-env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("sandbox"))
            .mount(&server)
            .await;
        let (mut session, _store) = session(&server).await;
        text(&mut session, "testerId", "type2tppcallback").await;
        assert!(!session.field_groups().vrp_available);

        session.load_token_env().await;
        assert!(session.field_groups().vrp_available);

        session.load_token_env().await;
        assert_eq!(session.env(), Some("sandbox"));
        assert!(!session.field_groups().vrp_available);
    }
}
