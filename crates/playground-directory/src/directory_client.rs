//! HTTP client for the bank directory and tester lookup.
//!
//! Endpoints:
//! - GET {api_url}/banks?providers=..&memberId=..&country=..[&search=..]
//! - GET {app_url}/testerId-info?testerId=..&memberType=..&tppCallback=..

use std::time::Duration;

use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use playground_types::{Bank, MemberType, PlaygroundError, Result};

const SERVICE_BANKS: &str = "bank directory";
const SERVICE_TESTER: &str = "tester info";

/// Header carrying the developer key on directory requests.
pub const DEV_KEY_HEADER: &str = "token-dev-key";

/// Page of directory results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankList {
    #[serde(default)]
    pub banks: Vec<Bank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paging {
    pub page: u32,
    pub per_page: u32,
    pub page_count: u32,
    pub total_count: u32,
}

/// Sandbox member behind a tester id, and the countries it may test in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesterInfo {
    pub member_id: String,
    #[serde(default)]
    pub country_code_list: Vec<String>,
}

/// Encode query pairs with spaces as `%20`, the form the directory expects.
pub fn encode_query(pairs: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| PlaygroundError::Other(format!("query encoder: {e}")))?;
    url.query_pairs_mut().extend_pairs(pairs);
    Ok(url.query().unwrap_or_default().replace('+', "%20"))
}

/// Directory URL scoped to the configured providers and a sandbox member.
pub fn banks_base_url(api_url: &str, providers: &[String], member_id: &str) -> Result<String> {
    let mut pairs: Vec<(&str, &str)> =
        providers.iter().map(|provider| ("providers", provider.as_str())).collect();
    pairs.push(("memberId", member_id));
    Ok(format!("{}/banks?{}", api_url.trim_end_matches('/'), encode_query(&pairs)?))
}

/// Bank directory client.
pub struct DirectoryClient {
    app_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl DirectoryClient {
    pub fn new(app_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(20_000));
        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
            timeout,
        }
    }

    /// List banks for a country, optionally narrowed by a name search.
    pub async fn list_banks(
        &self,
        banks_base_url: &str,
        country: &str,
        search: Option<&str>,
        dev_key: &str,
    ) -> Result<BankList> {
        let mut pairs = vec![("country", country)];
        if let Some(search) = search {
            pairs.push(("search", search));
        }
        let url = format!("{}&{}", banks_base_url, encode_query(&pairs)?);

        let resp = self
            .client
            .get(&url)
            .header(DEV_KEY_HEADER, dev_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlaygroundError::Http { service: SERVICE_BANKS, message: e.to_string() })?;

        check_status(SERVICE_BANKS, resp)
            .await?
            .json()
            .await
            .map_err(|e| PlaygroundError::Decode { service: SERVICE_BANKS, message: e.to_string() })
    }

    /// Resolve the sandbox member for a tester.
    pub async fn tester_info(
        &self,
        tester_id: &str,
        member_type: Option<MemberType>,
        tpp_callback: bool,
    ) -> Result<TesterInfo> {
        let tpp_callback = tpp_callback.to_string();
        let query = encode_query(&[
            ("testerId", tester_id),
            ("memberType", member_type.map(|m| m.as_str()).unwrap_or_default()),
            ("tppCallback", tpp_callback.as_str()),
        ])?;
        let url = format!("{}/testerId-info?{}", self.app_url, query);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlaygroundError::Http { service: SERVICE_TESTER, message: e.to_string() })?;

        check_status(SERVICE_TESTER, resp)
            .await?
            .json()
            .await
            .map_err(|e| PlaygroundError::Decode { service: SERVICE_TESTER, message: e.to_string() })
    }
}

async fn check_status(service: &'static str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PlaygroundError::Status { service, status: status.as_u16(), body })
}
