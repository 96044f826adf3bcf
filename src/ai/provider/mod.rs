//! LLM Provider Abstraction
//!
//! Defines the [`LlmProvider`] trait that turns a [`DocumentationRequest`]
//! into Markdown. All providers report token usage taken from the
//! provider's own accounting so cost can be computed downstream.
//!
//! Every call is a single attempt. Failures come back as [`LlmError`] with
//! an [`ErrorCategory`].

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::ai::prompt::DocumentationRequest;
use crate::constants::{llm, network};
use crate::types::{DocError, Result};

// =============================================================================
// Model Response
// =============================================================================

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self::new(prompt_tokens, completion_tokens)
    }

    /// Create from Ollama-style usage response
    pub fn from_ollama(prompt_eval_count: u32, eval_count: u32) -> Self {
        Self::new(prompt_eval_count, eval_count)
    }
}

/// Generated documentation plus the provider's accounting
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Markdown body as returned by the model
    pub markdown: String,
    pub usage: TokenUsage,
    /// Configured model id (the key used for pricing)
    pub model: String,
    pub provider: String,
    /// Wall-clock time of the HTTP round-trip
    pub duration: Duration,
}

/// Shared LLM provider type
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Each provider converts the key to `SecretString` on construction.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Provider type: "openai", "anthropic", "gemini", "ollama"
    pub provider: String,
    /// Model id, also the key into the cost table
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Never serialized to output
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (OpenAI-compatible gateways, self-hosted Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: llm::DEFAULT_TEMPERATURE,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            api_key: None,
            api_base: None,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one documentation request. Exactly one HTTP attempt.
    ///
    /// `config` supplies the per-call model, temperature and output limit.
    /// Connection settings were bound when the provider was built.
    async fn send(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> Result<ModelResponse>;

    /// Provider name for logging and run records
    fn name(&self) -> &str;
}

/// Supported provider names, for help text and validation
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "anthropic", "gemini", "ollama"];

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        _ => Err(DocError::Config(format!(
            "Unknown provider: {}. Supported: {}",
            config.provider,
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

// =============================================================================
// Shared HTTP Helpers
// =============================================================================

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(
            network::CONNECTION_TIMEOUT_SECS.min(timeout_secs),
        ))
        .build()
        .map_err(|e| DocError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Read the body and decode it, classifying non-2xx statuses first
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    provider: &str,
) -> std::result::Result<T, LlmError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    if !status.is_success() {
        debug!("{} answered {}: {}", provider, status, body);
        let message = format!("{} API error ({}): {}", provider, status, truncate_body(&body));
        return Err(ErrorClassifier::classify_http_status(
            status.as_u16(),
            &message,
            provider,
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        LlmError::malformed(format!("Failed to parse {} response: {}", provider, e), provider)
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Reject empty model output
fn require_text(
    text: Option<String>,
    provider: &str,
) -> std::result::Result<String, LlmError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LlmError::malformed(
            format!("No content in {} response", provider),
            provider,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage() {
        let usage = TokenUsage::from_openai(100, 50);
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
        assert_eq!(usage.total(), 150);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = ProviderConfig {
            provider: "gpt-neo-local".to_string(),
            ..Default::default()
        };
        match create_provider(&config) {
            Err(DocError::Config(msg)) => assert!(msg.contains("gpt-neo-local")),
            other => panic!("expected config error, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[test]
    fn test_create_provider_by_name() {
        for name in SUPPORTED_PROVIDERS {
            let config = ProviderConfig {
                provider: name.to_string(),
                api_key: Some("k".to_string()),
                ..Default::default()
            };
            let provider = create_provider(&config).unwrap();
            assert_eq!(provider.name(), *name);
        }
    }

    #[test]
    fn test_require_text() {
        assert!(require_text(Some("## 1. Overview".into()), "openai").is_ok());
        let err = require_text(Some("   ".into()), "openai").unwrap_err();
        assert_eq!(err.category, ErrorCategory::Malformed);
        assert!(require_text(None, "openai").is_err());
    }
}
