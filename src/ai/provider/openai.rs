//! OpenAI API Provider
//!
//! Chat Completions API. Works with any OpenAI-compatible base URL.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::{
    ErrorClassifier, LlmProvider, ModelResponse, ProviderConfig, TokenUsage, build_client,
    decode_response, require_text,
};
use crate::ai::prompt::DocumentationRequest;
use crate::types::{DocError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const NAME: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                DocError::Config(format!(
                    "OpenAI API key not found. Set {} env var or provide in config",
                    API_KEY_ENV
                ))
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_message.clone(),
                },
            ],
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn send(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> Result<ModelResponse> {
        info!(
            "Documenting {} with OpenAI (model: {}, temperature: {})",
            request.file_name, config.model, config.temperature
        );

        let start_time = Instant::now();
        let body = self.build_request(request, config);
        let url = format!("{}/chat/completions", self.api_base);

        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, NAME))?;

        let response_body: ChatCompletionResponse = decode_response(response, NAME).await?;
        let elapsed = start_time.elapsed();

        // Missing usage block means zero, never an estimate
        let usage = response_body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let markdown = require_text(
            response_body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            NAME,
        )?;

        debug!(
            "OpenAI returned {} chars ({} in / {} out tokens) in {:?}",
            markdown.len(),
            usage.input_tokens,
            usage.output_tokens,
            elapsed
        );

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
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
