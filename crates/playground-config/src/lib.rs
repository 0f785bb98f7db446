//! Layered configuration for the playground: defaults, TOML file, environment, overrides.
//!
//! Precedence: overrides > `PLAYGROUND_*` env > file > defaults.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub playground: PlaygroundSettings,
    pub logging: LoggingConfig,
}

/// Endpoints and HTTP behaviour for the sandbox services.
#[derive(Clone, Debug, Serialize)]
pub struct ApiConfig {
    /// Playground web server (tester info, IBAN check, token request).
    pub app_url: String,
    /// Token API hosting the bank directory.
    pub api_url: String,
    pub request_timeout_ms: u64,
    /// Crowd-sourced sessions post to `/test-tool` instead of `/playground`.
    pub crowd_source: bool,
    pub user_agent: String,
    pub default_dev_key: String,
    pub providers: Vec<String>,
}

impl ApiConfig {
    pub fn page_path(&self) -> &'static str {
        if self.crowd_source {
            "/test-tool"
        } else {
            "/playground"
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// Ambient settings the validator and session read explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaygroundSettings {
    pub currencies: Vec<String>,
    pub countries: Vec<Country>,
    pub tester_ids: Vec<String>,
    pub vrp_tester_ids: Vec<String>,
    pub amounts: Vec<String>,
    /// tester id (lowercase) -> request type -> customization id
    pub customization_ids: BTreeMap<String, BTreeMap<String, String>>,
}

impl PlaygroundSettings {
    pub fn default_currency(&self) -> &str {
        self.currencies.first().map(String::as_str).unwrap_or("EUR")
    }

    pub fn is_tester_whitelisted(&self, tester_id: &str) -> bool {
        !tester_id.is_empty()
            && self.tester_ids.iter().any(|allowed| allowed.eq_ignore_ascii_case(tester_id))
    }

    pub fn is_vrp_tester(&self, tester_id: &str) -> bool {
        self.vrp_tester_ids.iter().any(|allowed| allowed.eq_ignore_ascii_case(tester_id))
    }

    pub fn customization_id(&self, tester_id: &str, request_type: &str) -> Option<&str> {
        self.customization_ids
            .get(&tester_id.to_lowercase())?
            .get(request_type)
            .map(String::as_str)
    }

    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.iter().find(|country| country.code == code)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub app_url: Option<String>,
    pub api_url: Option<String>,
    pub crowd_source: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

const DEFAULT_PROVIDERS: [&str; 14] = [
    "Token",
    "mBank",
    "Citi",
    "Amex",
    "Starling",
    "CMA9",
    "Polish API",
    "STET",
    "NextGenPSD2",
    "Sparkasse",
    "Czech Open Banking Standard",
    "Slovak Banking API Standard",
    "Budapest Bank",
    "Mock",
];

const DEFAULT_COUNTRIES: [(&str, &str); 24] = [
    ("AT", "Austria"),
    ("BE", "Belgium"),
    ("BG", "Bulgaria"),
    ("CZ", "Czech Republic"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("HU", "Hungary"),
    ("IE", "Ireland"),
    ("IT", "Italy"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("SE", "Sweden"),
    ("SI", "Slovenia"),
    ("SK", "Slovakia"),
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for PlaygroundSettings {
    fn default() -> Self {
        Self {
            currencies: strings(&["EUR", "GBP", "PLN", "HUF", "NOK", "BGN", "DKK", "CZK", "SEK", "RON"]),
            countries: DEFAULT_COUNTRIES
                .iter()
                .map(|(code, name)| Country { code: code.to_string(), name: name.to_string() })
                .collect(),
            tester_ids: strings(&[
                "Token",
                "Type2Token",
                "Type2TokenCallback",
                "type2tppcallback",
                "type2tppcallbackwebapp",
            ]),
            vrp_tester_ids: strings(&["type2tppcallback", "type2tppcallbackwebapp"]),
            amounts: strings(&["1", "5", "10", "50"]),
            customization_ids: BTreeMap::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:3000/tokenApi".to_string(),
            request_timeout_ms: 20_000,
            crowd_source: false,
            user_agent: format!("playground/{}", env!("CARGO_PKG_VERSION")),
            default_dev_key: "global-test".to_string(),
            providers: strings(&DEFAULT_PROVIDERS),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            playground: PlaygroundSettings::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("playground.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(app_url) = api.app_url {
                self.api.app_url = app_url;
            }
            if let Some(api_url) = api.api_url {
                self.api.api_url = api_url;
            }
            if let Some(request_timeout_ms) = api.request_timeout_ms {
                self.api.request_timeout_ms = request_timeout_ms;
            }
            if let Some(crowd_source) = api.crowd_source {
                self.api.crowd_source = crowd_source;
            }
            if let Some(user_agent) = api.user_agent {
                self.api.user_agent = user_agent;
            }
            if let Some(default_dev_key) = api.default_dev_key {
                self.api.default_dev_key = default_dev_key;
            }
            if let Some(providers) = api.providers {
                self.api.providers = providers;
            }
        }

        if let Some(playground) = patch.playground {
            if let Some(currencies) = playground.currencies {
                self.playground.currencies = currencies;
            }
            if let Some(countries) = playground.countries {
                self.playground.countries = countries;
            }
            if let Some(tester_ids) = playground.tester_ids {
                self.playground.tester_ids = tester_ids;
            }
            if let Some(vrp_tester_ids) = playground.vrp_tester_ids {
                self.playground.vrp_tester_ids = vrp_tester_ids;
            }
            if let Some(amounts) = playground.amounts {
                self.playground.amounts = amounts;
            }
            if let Some(customization_ids) = playground.customization_ids {
                self.playground.customization_ids = customization_ids
                    .into_iter()
                    .map(|(tester_id, ids)| (tester_id.to_lowercase(), ids))
                    .collect();
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PLAYGROUND_APP_URL") {
            self.api.app_url = value;
        }
        if let Some(value) = read_env("PLAYGROUND_API_URL") {
            self.api.api_url = value;
        }
        if let Some(value) = read_env("PLAYGROUND_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = parse_u64("PLAYGROUND_REQUEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("PLAYGROUND_CROWD_SOURCE") {
            self.api.crowd_source = parse_bool("PLAYGROUND_CROWD_SOURCE", &value)?;
        }
        if let Some(value) = read_env("PLAYGROUND_DEV_KEY") {
            self.api.default_dev_key = value;
        }
        if let Some(value) = read_env("PLAYGROUND_TESTER_IDS") {
            self.playground.tester_ids = split_list(&value);
        }
        if let Some(value) = read_env("PLAYGROUND_CURRENCIES") {
            self.playground.currencies = split_list(&value);
        }

        let log_level =
            read_env("PLAYGROUND_LOGGING_LEVEL").or_else(|| read_env("PLAYGROUND_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PLAYGROUND_LOGGING_FORMAT").or_else(|| read_env("PLAYGROUND_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(app_url) = overrides.app_url {
            self.api.app_url = app_url;
        }
        if let Some(api_url) = overrides.api_url {
            self.api.api_url = api_url;
        }
        if let Some(crowd_source) = overrides.crowd_source {
            self.api.crowd_source = crowd_source;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_playground(&self.playground)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("playground.toml"), PathBuf::from("config/playground.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }
            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }
        output.push(ch);
    }

    Ok(output)
}

fn validate_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    validate_url("api.app_url", &api.app_url)?;
    validate_url("api.api_url", &api.api_url)?;

    if api.request_timeout_ms == 0 || api.request_timeout_ms > 300_000 {
        return Err(ConfigError::Validation(
            "api.request_timeout_ms must be in range 1..=300000".to_string(),
        ));
    }
    if api.providers.is_empty() {
        return Err(ConfigError::Validation("api.providers must not be empty".to_string()));
    }
    Ok(())
}

fn validate_playground(playground: &PlaygroundSettings) -> Result<(), ConfigError> {
    if playground.currencies.is_empty() {
        return Err(ConfigError::Validation(
            "playground.currencies must list at least one currency".to_string(),
        ));
    }
    if let Some(bad) = playground
        .currencies
        .iter()
        .find(|code| code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()))
    {
        return Err(ConfigError::Validation(format!(
            "playground.currencies contains `{bad}`, expected an upper-case ISO 4217 code"
        )));
    }
    if let Some(bad) = playground
        .countries
        .iter()
        .find(|country| country.code.len() != 2 || country.name.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "playground.countries entry `{}` needs a two-letter code and a name",
            bad.code
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    playground: Option<PlaygroundPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    app_url: Option<String>,
    api_url: Option<String>,
    request_timeout_ms: Option<u64>,
    crowd_source: Option<bool>,
    user_agent: Option<String>,
    default_dev_key: Option<String>,
    providers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaygroundPatch {
    currencies: Option<Vec<String>>,
    countries: Option<Vec<Country>>,
    tester_ids: Option<Vec<String>>,
    vrp_tester_ids: Option<Vec<String>>,
    amounts: Option<Vec<String>>,
    customization_ids: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
