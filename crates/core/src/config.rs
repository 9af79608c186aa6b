use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use url::Url;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const ENV_HISTORY_PATH: &str = "MOODSCOUT_HISTORY";
pub const ENV_ANTHROPIC_MODEL: &str = "MOODSCOUT_MODEL";
pub const ENV_ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_ELEVENLABS_BASE_URL: &str = "ELEVENLABS_BASE_URL";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub anthropic: Option<ApiKey>,
    pub elevenlabs: Option<ApiKey>,
}

/// Base URL of an HTTP API, stored without a trailing slash.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(value.trim())
            .map_err(|e| ConfigError::InvalidEndpoint(value.to_owned(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint(
                value.to_owned(),
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }
        Ok(Self(url.as_str().trim_end_matches('/').to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub base_url: Endpoint,
}

impl LlmConfig {
    pub fn new<S: Into<String>>(model: S, max_tokens: u32) -> Result<Self, ConfigError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        Ok(Self {
            model,
            max_tokens,
            ..Self::default()
        })
    }

    pub fn with_base_url(mut self, base_url: Endpoint) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_ANTHROPIC_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: Endpoint(DEFAULT_ANTHROPIC_BASE_URL.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeechConfig {
    pub model_id: String,
    pub base_url: Endpoint,
}

impl SpeechConfig {
    pub fn with_base_url(mut self, base_url: Endpoint) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_ELEVENLABS_MODEL.to_owned(),
            base_url: Endpoint(DEFAULT_ELEVENLABS_BASE_URL.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_keys: ApiKeys,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub history_path: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("model name must not be empty")]
    EmptyModel,
    #[error("max tokens must be > 0")]
    ZeroMaxTokens,
    #[error("invalid endpoint {0:?}: {1}")]
    InvalidEndpoint(String, String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}
