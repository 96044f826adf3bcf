//! Configuration Types
//!
//! All configuration structures with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::cost::CostTable;
use crate::ai::provider::{ProviderConfig, SUPPORTED_PROVIDERS};
use crate::constants::{ledger, llm, network, paths, prompt};
use crate::types::{DocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Prompt construction
    pub prompt: PromptConfig,

    /// Where documentation is written
    pub output: OutputConfig,

    /// Run history
    pub ledger: LedgerConfig,

    /// Model id to USD rates per 1K tokens
    pub pricing: CostTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            prompt: PromptConfig::default(),
            output: OutputConfig::default(),
            ledger: LedgerConfig::default(),
            pricing: CostTable::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(DocError::Config(format!(
                "Unknown LLM provider '{}'. Supported: {}",
                self.llm.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(DocError::Config("LLM model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(DocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(DocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(DocError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.prompt.max_chars == 0 {
            return Err(DocError::Config(
                "Prompt max_chars must be greater than 0".to_string(),
            ));
        }

        for (model, rate) in self.pricing.iter() {
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(rate.input_per_1k) || !valid(rate.output_per_1k) {
                return Err(DocError::Config(format!(
                    "Pricing for '{}' must be non-negative numbers",
                    model
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: openai, anthropic, gemini, ollama
    pub provider: String,

    /// Model id (also the pricing key)
    pub model: String,

    /// Sampling temperature; low values keep reports stable
    pub temperature: f32,

    /// Maximum output tokens per file
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Custom endpoint (OpenAI-compatible gateway, remote Ollama)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Falls back to OPENAI_API_KEY / ANTHROPIC_API_KEY. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            temperature: llm::DEFAULT_TEMPERATURE,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            api_base: None,
            api_key: None,
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

// =============================================================================
// Prompt / Output / Ledger
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Source characters sent per file before truncation
    pub max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_chars: prompt::DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,

    /// Also render a PDF next to each Markdown file
    pub pdf: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(paths::DEFAULT_OUTPUT_DIR),
            pdf: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Append-only JSONL history
    pub path: PathBuf,

    /// Default CSV export target
    pub export_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let dir = PathBuf::from(paths::PROJECT_DIR);
        Self {
            path: dir.join(ledger::FILE_NAME),
            export_path: dir.join(ledger::EXPORT_FILE_NAME),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
