//! Anthropic Messages API Provider

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

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";
const NAME: &str = "anthropic";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                DocError::Config(format!(
                    "Anthropic API key not found. Set {} env var or provide in config",
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
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn send(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> Result<ModelResponse> {
        info!(
            "Documenting {} with Anthropic (model: {}, temperature: {})",
            request.file_name, config.model, config.temperature
        );

        let start_time = Instant::now();
        let body = MessagesRequest {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: request.system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user_message.clone(),
            }],
        };
        let url = format!("{}/v1/messages", self.api_base);

        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, NAME))?;

        let response_body: MessagesResponse = decode_response(response, NAME).await?;
        let elapsed = start_time.elapsed();

        let usage = response_body
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        // Concatenate text blocks; tool or thinking blocks are ignored
        let text: String = response_body
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let markdown = require_text(Some(text), NAME)?;

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

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
