//! Bank directory lookups for the playground.
//!
//! The directory is scoped to a sandbox member: a tester lookup resolves the
//! member id and the countries it may test in, which fixes the base URL every
//! later bank query extends with a country and optional search term.

pub mod directory_client;

use serde::Serialize;
use playground_config::{ApiConfig, Country};
use playground_types::{Bank, MemberType, PlaygroundError, Result};

pub use directory_client::{banks_base_url, BankList, DirectoryClient, Paging, TesterInfo};

/// Directory event for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DirectoryEvent {
    TesterResolved { member_id: String, countries: usize },
    BanksLoaded { country: String, search: Option<String>, count: usize },
    Error { message: String },
}

/// Callback type for directory events.
pub type DirectoryEventHandler = Box<dyn Fn(DirectoryEvent) + Send + Sync>;

/// Tester profile fields the tester lookup is keyed by.
#[derive(Debug, Clone, Copy)]
pub struct TesterQuery<'a> {
    pub tester_id: &'a str,
    pub member_type: Option<MemberType>,
    pub tpp_callback: bool,
}

/// Known countries for the given codes, sorted by name. Unknown codes are dropped.
pub fn format_country_list(codes: &[String], known: &[Country]) -> Vec<Country> {
    let mut countries: Vec<Country> = codes
        .iter()
        .filter_map(|code| known.iter().find(|country| &country.code == code))
        .cloned()
        .collect();
    countries.sort_by(|a, b| a.name.cmp(&b.name));
    countries
}

/// Cached directory state for one session.
pub struct BankDirectory {
    client: DirectoryClient,
    api_url: String,
    providers: Vec<String>,
    default_dev_key: String,
    member_id: Option<String>,
    banks_base_url: Option<String>,
    countries: Vec<Country>,
    banks: Vec<Bank>,
    on_event: Option<DirectoryEventHandler>,
}

impl BankDirectory {
    pub fn new(api: &ApiConfig, on_event: Option<DirectoryEventHandler>) -> Self {
        Self {
            client: DirectoryClient::new(&api.app_url, Some(api.request_timeout_ms)),
            api_url: api.api_url.clone(),
            providers: api.providers.clone(),
            default_dev_key: api.default_dev_key.clone(),
            member_id: None,
            banks_base_url: None,
            countries: Vec::new(),
            banks: Vec::new(),
            on_event,
        }
    }

    fn emit(&self, event: DirectoryEvent) {
        if let Some(ref handler) = self.on_event {
            handler(event);
        }
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            self.emit(DirectoryEvent::Error { message: e.to_string() });
        }
        result
    }

    pub fn member_id(&self) -> Option<&str> {
        self.member_id.as_deref()
    }

    pub fn banks_base_url(&self) -> Option<&str> {
        self.banks_base_url.as_deref()
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn bank(&self, id: &str) -> Option<&Bank> {
        self.banks.iter().find(|bank| bank.id == id)
    }

    pub fn clear_banks(&mut self) {
        self.banks.clear();
    }

    /// Developer key for directory calls: the draft's own or the configured default.
    pub fn dev_key<'a>(&'a self, draft_dev_key: &'a str) -> &'a str {
        if draft_dev_key.is_empty() {
            &self.default_dev_key
        } else {
            draft_dev_key
        }
    }

    /// Resolve the tester's member, rebuild the base URL and the country list.
    /// The country list is emptied first, so a failed lookup leaves none.
    pub async fn load_tester(&mut self, query: TesterQuery<'_>, known: &[Country]) -> Result<()> {
        self.countries.clear();
        let result = self
            .client
            .tester_info(query.tester_id, query.member_type, query.tpp_callback)
            .await;
        let info = self.report(result)?;
        let base_url = self.report(banks_base_url(&self.api_url, &self.providers, &info.member_id))?;

        tracing::debug!(
            tester_id = query.tester_id,
            member_id = %info.member_id,
            countries = info.country_code_list.len(),
            "tester resolved"
        );

        self.countries = format_country_list(&info.country_code_list, known);
        self.banks_base_url = Some(base_url);
        self.emit(DirectoryEvent::TesterResolved {
            member_id: info.member_id.clone(),
            countries: self.countries.len(),
        });
        self.member_id = Some(info.member_id);
        Ok(())
    }

    /// Replace the bank list with the banks of a country.
    pub async fn load_country(&mut self, country: &str, dev_key: &str) -> Result<&[Bank]> {
        self.banks.clear();
        self.fetch(country, None, dev_key).await
    }

    /// Narrow the bank list by name. An empty search leaves the list untouched.
    pub async fn search(&mut self, country: &str, search: &str, dev_key: &str) -> Result<&[Bank]> {
        if search.is_empty() {
            return Ok(&self.banks);
        }
        self.fetch(country, Some(search), dev_key).await
    }

    async fn fetch(&mut self, country: &str, search: Option<&str>, dev_key: &str) -> Result<&[Bank]> {
        let base_url = self.banks_base_url.clone().ok_or_else(|| {
            PlaygroundError::Other("bank directory used before the tester was resolved".into())
        })?;
        let dev_key = self.dev_key(dev_key).to_string();

        let result = self.client.list_banks(&base_url, country, search, &dev_key).await;
        let list = self.report(result)?;

        tracing::debug!(country, search, count = list.banks.len(), "banks loaded");
        self.emit(DirectoryEvent::BanksLoaded {
            country: country.to_string(),
            search: search.map(str::to_string),
            count: list.banks.len(),
        });
        self.banks = list.banks;
        Ok(&self.banks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> ApiConfig {
        ApiConfig {
            app_url: server.uri(),
            api_url: format!("{}/tokenApi", server.uri()),
            providers: vec!["Token".into(), "Polish API".into()],
            ..ApiConfig::default()
        }
    }

    fn known() -> Vec<Country> {
        vec![
            Country { code: "DE".into(), name: "Germany".into() },
            Country { code: "AT".into(), name: "Austria".into() },
            Country { code: "PL".into(), name: "Poland".into() },
        ]
    }

    fn token() -> TesterQuery<'static> {
        TesterQuery { tester_id: "Token", member_type: Some(MemberType::Type1), tpp_callback: false }
    }

    async fn mount_tester(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/testerId-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memberId": "m:1",
                "countryCodeList": ["PL", "XX", "DE", "AT"]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn country_list_is_filtered_and_sorted_by_name() {
        let codes = vec!["PL".to_string(), "ZZ".into(), "DE".into(), "AT".into()];
        let names: Vec<_> =
            format_country_list(&codes, &known()).into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Austria", "Germany", "Poland"]);
    }

    #[tokio::test]
    async fn load_tester_builds_base_url_and_countries() {
        let server = MockServer::start().await;
        mount_tester(&server).await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler: DirectoryEventHandler = Box::new(move |e| sink.lock().unwrap().push(e));

        let mut directory = BankDirectory::new(&api(&server), Some(handler));
        directory.load_tester(token(), &known()).await.unwrap();

        assert_eq!(directory.member_id(), Some("m:1"));
        assert_eq!(
            directory.banks_base_url().unwrap(),
            format!("{}/tokenApi/banks?providers=Token&providers=Polish%20API&memberId=m%3A1", server.uri())
        );
        let codes: Vec<_> = directory.countries().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["AT", "DE", "PL"]);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            [DirectoryEvent::TesterResolved { member_id: "m:1".into(), countries: 3 }]
        );
    }

    #[tokio::test]
    async fn banks_require_a_resolved_tester() {
        let server = MockServer::start().await;
        let mut directory = BankDirectory::new(&api(&server), None);
        let err = directory.load_country("DE", "").await.unwrap_err();
        assert!(matches!(err, PlaygroundError::Other(_)));
    }

    #[tokio::test]
    async fn load_country_uses_default_dev_key() {
        let server = MockServer::start().await;
        mount_tester(&server).await;
        Mock::given(method("GET"))
            .and(path("/tokenApi/banks"))
            .and(query_param("country", "DE"))
            .and(header("token-dev-key", "global-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "banks": [
                    { "id": "ngp-db", "name": "Deutsche Bank" },
                    { "id": "ngp-cbk", "name": "Commerzbank" }
                ]
            })))
            .mount(&server)
            .await;

        let mut directory = BankDirectory::new(&api(&server), None);
        directory.load_tester(token(), &known()).await.unwrap();
        let banks = directory.load_country("DE", "").await.unwrap();
        assert_eq!(banks.len(), 2);
        assert_eq!(directory.bank("ngp-cbk").map(|b| b.name.as_str()), Some("Commerzbank"));
    }

    #[tokio::test]
    async fn empty_search_skips_the_request() {
        let server = MockServer::start().await;
        mount_tester(&server).await;
        Mock::given(method("GET"))
            .and(path("/tokenApi/banks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "banks": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let mut directory = BankDirectory::new(&api(&server), None);
        directory.load_tester(token(), &known()).await.unwrap();
        directory.search("DE", "", "dev").await.unwrap();
        directory.search("DE", "Bank", "dev").await.unwrap();
    }

    #[tokio::test]
    async fn failures_are_reported_as_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/testerId-info"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler: DirectoryEventHandler = Box::new(move |e| sink.lock().unwrap().push(e));
        let mut directory = BankDirectory::new(&api(&server), Some(handler));

        assert!(directory.load_tester(token(), &known()).await.is_err());
        assert!(directory.member_id().is_none());
        assert!(directory.countries().is_empty());
        assert!(matches!(events.lock().unwrap()[0], DirectoryEvent::Error { .. }));
    }
}
