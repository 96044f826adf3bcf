//! legacydoc - LLM-Driven Documentation for Legacy Code
//!
//! Reads a source file, asks an LLM for a fixed seven-section report,
//! writes it as Markdown (optionally PDF) and records every attempt in an
//! append-only ledger with token and cost accounting.
//!
//! ## Quick Start
//!
//! ```ignore
//! use legacydoc::{Config, DocPipeline, JsonlLedger, PipelineSettings, create_provider};
//!
//! let config = Config::default();
//! let settings = PipelineSettings::from_config(&config);
//! let provider = create_provider(&settings.provider)?;
//! let ledger = JsonlLedger::new(&config.ledger.path);
//! let mut pipeline = DocPipeline::new(settings, provider, ledger);
//! let record = pipeline.process_file("procs/GetMemberByID.sql".as_ref()).await?;
//! ```
//!
//! ## Modules
//!
//! - [`source`]: File reading, language detection, directory discovery
//! - [`ai`]: Prompt construction, LLM providers, cost calculation
//! - [`ledger`]: Run records, JSONL ledger, summaries, CSV export
//! - [`document`]: Markdown to paginated PDF
//! - [`pipeline`]: Single-file and batch orchestration
//! - [`config`]: Layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod ledger;
pub mod pipeline;
pub mod source;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{DocError, ErrorCategory, FormatError, LlmError, ReadError, Result};
pub use types::RunId;

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{BatchReport, DocPipeline, PipelineSettings};

// =============================================================================
// Component Re-exports
// =============================================================================

pub use ai::{
    CostCalculator, CostTable, DocumentationRequest, LlmProvider, ModelResponse, PromptBuilder,
    ProviderConfig, SharedProvider, TokenUsage, create_provider,
};
pub use document::DocumentFormatter;
pub use ledger::{JsonlLedger, LedgerSummary, MemoryLedger, RunLedger, RunRecord};
pub use source::{Language, SourceFile, discover};
