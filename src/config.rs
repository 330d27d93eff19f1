use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default provider endpoint (OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Inbound `/api/chat` body limit. Whole conversations are resent every turn.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Relay configuration, sourced once at startup and handed to `ChatRelay::new`.
///
/// The API key is never read from or written to the JSON file; it only comes from the
/// process environment (or `with_api_key` in code).
#[derive(Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    #[serde(skip)]
    api_key: Option<String>,

    /// Provider base URL; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overall outbound request timeout. `None` leaves it to the transport.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Largest accepted request body on the relay endpoint, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl RelayConfig {
    /// Load relay configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read relay config file: {}",
                path.as_ref().display()
            )
        })?;

        let config: RelayConfig = serde_json::from_str(&content)
            .with_context(|| "Failed to parse relay config JSON")?;

        Ok(config)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overlay the process environment on top of this configuration.
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by environment variable name).
    ///
    /// Environment:
    /// - CHAT_RELAY_API_KEY (fallback DEEPSEEK_API_KEY) -> provider API key
    /// - CHAT_RELAY_BASE_URL                            -> provider base URL
    /// - CHAT_RELAY_MODEL                               -> model identifier
    /// - CHAT_RELAY_HTTP_TIMEOUT_SECONDS                -> outbound timeout (u64)
    /// - CHAT_RELAY_MAX_BODY_BYTES                      -> inbound body limit (usize)
    ///
    /// Blank values are ignored.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = get("CHAT_RELAY_API_KEY").or_else(|| get("DEEPSEEK_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = get("CHAT_RELAY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = get("CHAT_RELAY_MODEL") {
            self.model = model;
        }
        if let Some(secs) = get("CHAT_RELAY_HTTP_TIMEOUT_SECONDS") {
            match secs.parse::<u64>() {
                Ok(n) => self.timeout_seconds = Some(n),
                Err(_) => tracing::warn!(value = %secs, "ignoring invalid CHAT_RELAY_HTTP_TIMEOUT_SECONDS"),
            }
        }
        if let Some(bytes) = get("CHAT_RELAY_MAX_BODY_BYTES") {
            match bytes.parse::<usize>() {
                Ok(n) => self.max_body_bytes = n,
                Err(_) => tracing::warn!(value = %bytes, "ignoring invalid CHAT_RELAY_MAX_BODY_BYTES"),
            }
        }
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The provider API key, if configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Full URL of the provider's chat completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
