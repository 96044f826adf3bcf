//! AI Integration Layer
//!
//! Prompt construction, LLM providers and cost estimation.

pub mod cost;
pub mod prompt;
pub mod provider;

pub use cost::{CostCalculator, CostEstimate, CostTable, ModelRate};
pub use prompt::{DOCUMENTATION_SECTIONS, DocumentationRequest, PromptBuilder, SYSTEM_PROMPT};
pub use provider::{
    AnthropicProvider, ErrorCategory, ErrorClassifier, GeminiProvider, LlmError, LlmProvider,
    ModelResponse, OllamaProvider, OpenAiProvider, ProviderConfig, SharedProvider, TokenUsage,
    create_provider,
};
