//! Relay core: frames a conversation into one provider call and normalizes the outcome.
//!
//! `ChatRelay` holds no per-call state. Every invocation validates its input, performs
//! exactly one outbound request and maps whatever comes back into either a `RelayReply`
//! or a `RelayError`. Provider error bodies and transport failures are logged here and
//! never reach the caller.

use http::header;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::models::{CompletionRequest, CompletionResponse, RelayReply, RelayRequest, Turn};
use crate::util::build_http_client;

/// Reply text used when the provider succeeds without any content.
pub const NO_RESPONSE_FALLBACK: &str = "No response from AI";

/// Stateless relay between chat clients and the completion provider.
pub struct ChatRelay {
    http: reqwest::Client,
    config: RelayConfig,
}

impl ChatRelay {
    /// Build a relay with an outbound client derived from `config`.
    pub fn new(config: RelayConfig) -> Self {
        let http = build_http_client(&config);
        Self { http, config }
    }

    /// Build a relay around an existing HTTP client.
    pub fn with_client(config: RelayConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relay one user message plus its history to the provider.
    pub async fn relay(&self, req: RelayRequest) -> Result<RelayReply, RelayError> {
        let message = req
            .message
            .filter(|m| !m.is_empty())
            .ok_or(RelayError::MissingField("message"))?;

        let api_key = self.config.api_key().ok_or_else(|| {
            tracing::error!("provider API key is not configured; refusing to relay");
            RelayError::ServiceMisconfigured
        })?;

        let payload = build_completion_request(&self.config, req.history, message);
        let url = self.config.completions_url();
        tracing::debug!(
            model = %payload.model,
            turns = payload.messages.len(),
            "relaying conversation to provider"
        );

        let resp = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "provider request failed");
                RelayError::InternalError
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "provider returned an error");
            return Err(RelayError::ProviderError(status));
        }

        let bytes = resp.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "failed reading provider response body");
            RelayError::InternalError
        })?;
        let completion: CompletionResponse = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(error = %e, "provider response did not match the completion schema");
            RelayError::InternalError
        })?;

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "provider usage"
            );
        }

        Ok(RelayReply::new(extract_reply(&completion)))
    }
}

/// Append the new user turn to `history`. Existing turns keep their order and content.
pub fn build_messages(mut history: Vec<Turn>, message: impl Into<String>) -> Vec<Turn> {
    history.push(Turn::user(message));
    history
}

/// Frame the provider request. Sampling parameters come from `config` only.
pub fn build_completion_request(
    config: &RelayConfig,
    history: Vec<Turn>,
    message: impl Into<String>,
) -> CompletionRequest {
    CompletionRequest {
        model: config.model.clone(),
        messages: build_messages(history, message),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

/// First choice's content, or `NO_RESPONSE_FALLBACK` when there is none.
pub fn extract_reply(completion: &CompletionResponse) -> String {
    completion
        .first_content()
        .unwrap_or(NO_RESPONSE_FALLBACK)
        .to_string()
}
