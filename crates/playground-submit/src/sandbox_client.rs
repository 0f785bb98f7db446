//! HTTP client for the playground server.
//!
//! Endpoints:
//! - POST {page_path}/request-token
//! - PUT /api/playground/validate-iban
//! - GET /playground/token-env

use std::time::Duration;

use serde_json::{json, Value};
use playground_types::{PlaygroundError, Result};

use crate::TokenRequest;

const SERVICE_TOKEN_REQUEST: &str = "token request";
const SERVICE_IBAN: &str = "iban validation";
const SERVICE_TOKEN_ENV: &str = "token env";

/// Playground server client.
pub struct SandboxClient {
    app_url: String,
    page_path: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SandboxClient {
    /// `page_path` is `/playground`, or `/test-tool` for crowd-sourced sessions.
    pub fn new(app_url: &str, page_path: &str, timeout_ms: Option<u64>) -> Self {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(20_000));
        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
            page_path: page_path.to_string(),
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
            timeout,
        }
    }

    /// Post a token request. Returns the server's reply, `None` for an empty body.
    ///
    /// POST {app_url}{page_path}/request-token
    pub async fn request_token(&self, request: &TokenRequest<'_>) -> Result<Option<Value>> {
        let url = format!("{}{}/request-token", self.app_url, self.page_path);
        tracing::debug!(
            %url,
            request_type = request.form.request_type.as_str(),
            bank_id = %request.form.bank_id,
            "posting token request"
        );

        let resp = self
            .client
            .post(&url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlaygroundError::Http {
                service: SERVICE_TOKEN_REQUEST,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| PlaygroundError::Http {
            service: SERVICE_TOKEN_REQUEST,
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(PlaygroundError::Status {
                service: SERVICE_TOKEN_REQUEST,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body).unwrap_or(Value::String(body))))
    }

    /// Ask the server whether an IBAN is valid. Any non-2xx answer means invalid.
    ///
    /// PUT {app_url}/api/playground/validate-iban
    pub async fn validate_iban(&self, iban: &str) -> Result<bool> {
        let url = format!("{}/api/playground/validate-iban", self.app_url);
        let resp = self
            .client
            .put(&url)
            .json(&json!({ "iban": iban }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlaygroundError::Http { service: SERVICE_IBAN, message: e.to_string() })?;

        let valid = resp.status().is_success();
        tracing::debug!(status = resp.status().as_u16(), valid, "iban checked");
        Ok(valid)
    }

    /// Sandbox environment name, e.g. `dev` or `sandbox`.
    ///
    /// GET {app_url}/playground/token-env
    pub async fn token_env(&self) -> Result<String> {
        let url = format!("{}/playground/token-env", self.app_url);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlaygroundError::Http { service: SERVICE_TOKEN_ENV, message: e.to_string() })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| PlaygroundError::Decode {
            service: SERVICE_TOKEN_ENV,
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(PlaygroundError::Status { service: SERVICE_TOKEN_ENV, status: status.as_u16(), body });
        }

        // Plain text or a JSON string, depending on the server.
        match serde_json::from_str::<String>(&body) {
            Ok(env) => Ok(env),
            Err(_) => Ok(body.trim().to_string()),
        }
    }
}
