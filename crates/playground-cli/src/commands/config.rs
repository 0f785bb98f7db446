use playground_config::AppConfig;
use serde_json::Value;

use super::CommandResult;

/// Effective configuration after file, environment and flag overrides, with
/// the developer key redacted.
pub fn run(config: &AppConfig) -> CommandResult {
    let mut payload = match serde_json::to_value(config) {
        Ok(payload) => payload,
        Err(error) => return CommandResult::failure("config", "serialization", error.to_string(), 1),
    };
    if let Some(key) = payload.pointer_mut("/api/default_dev_key") {
        *key = Value::String(redact_token(&config.api.default_dev_key));
    }
    CommandResult::success("config", payload)
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
