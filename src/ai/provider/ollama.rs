//! Ollama Local LLM Provider
//!
//! Provider for locally-running Ollama models. Token counts come from
//! `prompt_eval_count` / `eval_count`; local models are normally unpriced.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    ErrorCategory, ErrorClassifier, LlmError, LlmProvider, ModelResponse, ProviderConfig,
    TokenUsage, build_client, decode_response, require_text,
};
use crate::ai::prompt::DocumentationRequest;
use crate::types::{DocError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const NAME: &str = "ollama";

pub struct OllamaProvider {
    api_base: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;

        Ok(Self {
            api_base,
            client: build_client(config.timeout_secs)?,
        })
    }

    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            DocError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        // Remove trailing slash for consistency
        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn send(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> Result<ModelResponse> {
        info!(
            "Documenting {} with Ollama (model: {}, temperature: {})",
            request.file_name, config.model, config.temperature
        );

        let start_time = Instant::now();
        let body = OllamaRequest {
            model: config.model.clone(),
            system: request.system.to_string(),
            prompt: request.user_message.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        };
        let url = format!("{}/api/generate", self.api_base);

        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let mut err = ErrorClassifier::classify_transport(&e, NAME);
                if err.category == ErrorCategory::Network {
                    err = LlmError::with_provider(
                        ErrorCategory::Network,
                        format!(
                            "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                            self.api_base
                        ),
                        NAME,
                    );
                }
                err
            })?;

        let response_body: OllamaResponse = decode_response(response, NAME).await?;
        let elapsed = start_time.elapsed();

        let usage = TokenUsage::from_ollama(
            response_body.prompt_eval_count.unwrap_or(0),
            response_body.eval_count.unwrap_or(0),
        );
        let markdown = require_text(response_body.response, NAME)?;

        Ok(ModelResponse {
            markdown,
            usage,
            model: config.model.clone(),
            provider: NAME.to_string(),
            duration: elapsed,
        })
    }

    fn name(&self) -> &str {
        NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
