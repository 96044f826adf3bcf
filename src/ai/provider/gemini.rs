//! Google Gemini API Provider
//!
//! `generateContent` on the Generative Language API. Model ids may carry a
//! `gemini/` or `models/` prefix; the configured id is kept for pricing and
//! the bare name goes into the URL.

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

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const NAME: &str = "gemini";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                DocError::Config(format!(
                    "Gemini API key not found. Set {} env var or provide in config",
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

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base,
            model_name(model)
        )
    }
}

/// Bare model name as the API expects it in the path
fn model_name(model: &str) -> &str {
    let model = model.trim();
    let model = model.strip_prefix("gemini/").unwrap_or(model);
    model.strip_prefix("models/").unwrap_or(model)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn send(
        &self,
        request: &DocumentationRequest,
        config: &ProviderConfig,
    ) -> Result<ModelResponse> {
        info!(
            "Documenting {} with Gemini (model: {}, temperature: {})",
            request.file_name, config.model, config.temperature
        );

        let start_time = Instant::now();
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system.to_string()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.user_message.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };
        let url = self.generate_url(&config.model);

        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, NAME))?;

        let response_body: GenerateContentResponse = decode_response(response, NAME).await?;
        let elapsed = start_time.elapsed();

        let usage = response_body
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        // First candidate only; its text parts form the answer
        let text = response_body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            });
        let markdown = require_text(text, NAME)?;

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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
