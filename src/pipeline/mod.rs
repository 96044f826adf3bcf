//! Documentation Pipeline
//!
//! Read → prompt → provider → output → ledger, one file at a time.
//!
//! Every attempt produces exactly one [`RunRecord`], success or failure.
//! Batches keep going past failed files; a single file surfaces its error
//! after the record is written. Ledger write failures never abort a run:
//! they are logged and counted.

mod output;

pub use output::{OutputWriter, WrittenOutput, compose};

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use crate::ai::cost::{CostCalculator, CostEstimate, CostTable};
use crate::ai::prompt::PromptBuilder;
use crate::ai::provider::{ProviderConfig, SharedProvider, TokenUsage};
use crate::config::Config;
use crate::ledger::{RunLedger, RunRecord};
use crate::source::{Language, SourceFile};
use crate::types::{DocError, Result, RunId};

// =============================================================================
// Settings
// =============================================================================

/// Everything the pipeline needs from configuration, resolved once
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub provider: ProviderConfig,
    pub max_chars: usize,
    pub output_dir: PathBuf,
    pub pdf: bool,
    pub pricing: CostTable,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.llm.provider_config(),
            max_chars: config.prompt.max_chars,
            output_dir: config.output.dir.clone(),
            pdf: config.output.pdf,
            pricing: config.pricing.clone(),
        }
    }
}

// =============================================================================
// Batch Report
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files_processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_usd: f64,
    /// Records that could not be appended to the ledger
    pub ledger_failures: usize,
    /// One record per file, in processing order
    pub outcomes: Vec<RunRecord>,
}

impl BatchReport {
    fn add(&mut self, record: RunRecord) {
        self.files_processed += 1;
        if record.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total_input_tokens += record.input_tokens as u64;
        self.total_output_tokens += record.output_tokens as u64;
        self.total_cost_usd += record.cost_usd;
        self.outcomes.push(record);
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunRecord> {
        self.outcomes.iter().filter(|r| !r.success)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Facts gathered during an attempt, kept even when a later step fails
#[derive(Default)]
struct Attempt {
    /// Canonical path and language, known once the read succeeds
    source: Option<(PathBuf, Language)>,
    usage: Option<(TokenUsage, CostEstimate)>,
}

pub struct DocPipeline<L: RunLedger> {
    run_id: RunId,
    provider: SharedProvider,
    provider_config: ProviderConfig,
    prompts: PromptBuilder,
    costs: CostCalculator,
    output: OutputWriter,
    ledger: L,
    ledger_failures: usize,
}

impl<L: RunLedger> DocPipeline<L> {
    pub fn new(settings: PipelineSettings, provider: SharedProvider, ledger: L) -> Self {
        Self {
            run_id: RunId::new(),
            provider,
            prompts: PromptBuilder::new(settings.max_chars),
            costs: CostCalculator::new(settings.pricing),
            output: OutputWriter::new(settings.output_dir, settings.pdf),
            provider_config: settings.provider,
            ledger,
            ledger_failures: 0,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Appends that failed since the pipeline was built
    pub fn ledger_failures(&self) -> usize {
        self.ledger_failures
    }

    /// Document one file. The run record is appended before any error is
    /// returned.
    pub async fn process_file(&mut self, path: &Path) -> Result<RunRecord> {
        let (record, result) = self.attempt(path).await;
        self.append(&record);
        result.map(|()| record)
    }

    /// Document files in order. Per-file failures become failed records.
    #[instrument(skip(self, paths), fields(run_id = %self.run_id, files = paths.len()))]
    pub async fn process_batch(&mut self, paths: &[PathBuf]) -> BatchReport {
        let failures_before = self.ledger_failures;
        let mut report = BatchReport::default();

        for (index, path) in paths.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, paths.len(), path.display());
            let (record, result) = self.attempt(path).await;
            if let Err(e) = result {
                warn!("Failed {}: {}", path.display(), e);
            }
            self.append(&record);
            report.add(record);
        }

        report.ledger_failures = self.ledger_failures - failures_before;
        info!(
            "Batch complete: {} succeeded, {} failed, ${:.4}",
            report.succeeded, report.failed, report.total_cost_usd
        );
        report
    }

    async fn attempt(&self, path: &Path) -> (RunRecord, Result<()>) {
        let started = Instant::now();
        let mut record = RunRecord::begin(
            self.run_id,
            path,
            self.provider.name(),
            &self.provider_config.model,
        );

        let mut attempt = Attempt::default();
        let result = self.generate(path, &mut attempt).await;
        let elapsed = started.elapsed();

        if let Some((canonical, language)) = attempt.source {
            record = record.with_source(canonical, language);
        }
        if let Some((usage, estimate)) = attempt.usage {
            record = record.with_usage(usage, estimate);
        }

        match result {
            Ok(written) => {
                info!(
                    "Documented {} ({} tokens, ${:.4}) -> {}",
                    path.display(),
                    record.total_tokens(),
                    record.cost_usd,
                    written.markdown_path.display()
                );
                (
                    record.succeed(elapsed, written.markdown_path, written.pdf_path),
                    Ok(()),
                )
            }
            Err(e) => (record.fail(elapsed, &e), Err(e)),
        }
    }

    async fn generate(&self, path: &Path, attempt: &mut Attempt) -> Result<WrittenOutput> {
        let source = SourceFile::read(path)?;
        attempt.source = Some((source.path().to_path_buf(), source.language()));

        let request = self.prompts.build(&source);
        if request.truncated {
            warn!(
                "{} truncated to {} of {} characters",
                request.file_name,
                self.prompts.max_chars(),
                request.original_chars
            );
        }

        let response = self.provider.send(&request, &self.provider_config).await?;
        let estimate = self.costs.calculate(
            &self.provider_config.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        );
        attempt.usage = Some((response.usage, estimate));

        self.output.write(&request.file_name, &response.markdown)
    }

    fn append(&mut self, record: &RunRecord) {
        if let Err(e) = self.ledger.append(record) {
            self.ledger_failures += 1;
            let line = serde_json::to_string(record).unwrap_or_default();
            error!(
                "Failed to record run for {}: {} | record: {}",
                record.file_path.display(),
                e,
                line
            );
        }
    }
}

impl<L: RunLedger> std::fmt::Debug for DocPipeline<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocPipeline")
            .field("run_id", &self.run_id)
            .field("provider", &self.provider.name())
            .field("model", &self.provider_config.model)
            .field("output_dir", &self.output.dir())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::{DOCUMENTATION_SECTIONS, DocumentationRequest};
    use crate::ai::provider::{
        ErrorCategory, LlmError, LlmProvider, ModelResponse, OpenAiProvider, create_provider,
    };
    use crate::ledger::{JsonlLedger, MemoryLedger};
    use crate::types::ReadErrorKind;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GET_MEMBER_SQL: &str = "\
CREATE PROCEDURE GetMemberByID
    @MemberID INT
AS
BEGIN
    SELECT m.MemberID, m.FirstName, a.Balance
    FROM Members m
    INNER JOIN Accounts a ON a.MemberID = m.MemberID
    WHERE m.MemberID = @MemberID;
END
";

    fn report_markdown() -> String {
        "## 1. Overview\n\nReturns one member with balances.\n\n\
         ## 2. Business Logic\n\nFilters by member id.\n\n\
         ## 3. Inputs\n\n| Name | Type | Description |\n|---|---|---|\n| @MemberID | INT | Member key |\n\n\
         ## 4. Outputs\n\nOne row per account.\n\n\
         ## 5. Dependencies\n\n- Members\n- Accounts\n\n\
         ## 6. Data Relationships\n\nINNER JOIN Accounts on MemberID.\n\n\
         ## 7. Best Practices Review\n\nAdd an index on Accounts.MemberID.\n"
            .to_string()
    }

    /// Answers every request except for one file name
    struct ScriptedProvider {
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(fail_on: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on: fail_on.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn send(
            &self,
            request: &DocumentationRequest,
            config: &ProviderConfig,
        ) -> Result<ModelResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(request.file_name.as_str()) {
                return Err(
                    LlmError::with_provider(ErrorCategory::Unavailable, "overloaded", "scripted")
                        .into(),
                );
            }
            Ok(ModelResponse {
                markdown: report_markdown(),
                usage: TokenUsage::new(1000, 500),
                model: config.model.clone(),
                provider: "scripted".to_string(),
                duration: Duration::from_millis(5),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn settings(output_dir: &Path) -> PipelineSettings {
        PipelineSettings {
            provider: ProviderConfig::default(),
            max_chars: 60_000,
            output_dir: output_dir.to_path_buf(),
            pdf: false,
            pricing: CostTable::default(),
        }
    }

    fn write_sources(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, format!("-- {}\nSELECT 1;\n", name)).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_continues_after_provider_failure() {
        let dir = TempDir::new().unwrap();
        let paths = write_sources(dir.path(), &["a.sql", "b.py", "c.cpp", "d.dax"]);
        let provider = ScriptedProvider::new(Some("c.cpp"));

        let mut pipeline = DocPipeline::new(
            settings(&dir.path().join("out")),
            provider.clone(),
            MemoryLedger::new(),
        );
        let report = pipeline.process_batch(&paths).await;

        assert_eq!(report.files_processed, 4);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.ledger_failures, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

        let records = pipeline.ledger().records().unwrap();
        assert_eq!(records.len(), 4);
        assert!(!records[2].success);
        assert_eq!(records[2].error_kind.as_deref(), Some("provider"));
        assert_eq!(records[2].language, Language::Cpp);
        assert!(records[3].success);
        assert!(records.iter().all(|r| r.run_id == pipeline.run_id()));

        assert!(dir.path().join("out/d.dax.md").exists());
        assert!(!dir.path().join("out/c.cpp.md").exists());
        assert_eq!(report.total_tokens(), 3 * 1500);
    }

    #[tokio::test]
    async fn test_binary_file_fails_before_provider() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("tool.exe");
        fs::write(&exe, [0x4d, 0x5a, 0x90, 0x00, 0x03, 0x00]).unwrap();
        let provider = ScriptedProvider::new(None);

        let mut pipeline =
            DocPipeline::new(settings(dir.path()), provider.clone(), MemoryLedger::new());
        let err = pipeline.process_file(&exe).await.unwrap_err();

        match err {
            DocError::Read(e) => assert_eq!(e.kind, ReadErrorKind::Decoding),
            other => panic!("expected read error, got {other:?}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let records = pipeline.ledger().records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].language, Language::Unknown);
        assert_eq!(records[0].input_tokens, 0);
    }

    #[tokio::test]
    async fn test_records_carry_canonical_path_once_read() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("procs")).unwrap();
        let paths = write_sources(dir.path(), &["a.sql"]);
        let indirect = dir.path().join("procs").join("..").join("a.sql");
        let missing = dir.path().join("procs").join("..").join("gone.sql");

        let mut pipeline = DocPipeline::new(
            settings(&dir.path().join("out")),
            ScriptedProvider::new(None),
            MemoryLedger::new(),
        );
        let first = pipeline.process_file(&indirect).await.unwrap();
        let second = pipeline.process_file(&paths[0]).await.unwrap();
        assert!(pipeline.process_file(&missing).await.is_err());

        let canonical = fs::canonicalize(&paths[0]).unwrap();
        assert_eq!(first.file_path, canonical);
        assert_eq!(second.file_path, first.file_path);

        let records = pipeline.ledger().records().unwrap();
        assert_eq!(records[0].file_path, records[1].file_path);
        // Unreadable input keeps the path as given
        assert_eq!(records[2].file_path, missing);
    }

    #[tokio::test]
    async fn test_ledger_failures_are_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let paths = write_sources(dir.path(), &["a.sql", "b.sql"]);
        let mut pipeline = DocPipeline::new(
            settings(&dir.path().join("out")),
            ScriptedProvider::new(None),
            MemoryLedger::unwritable(),
        );

        let report = pipeline.process_batch(&paths).await;
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.ledger_failures, 2);
        assert_eq!(pipeline.ledger_failures(), 2);

        let record = pipeline.process_file(&paths[0]).await.unwrap();
        assert!(record.success);
        assert_eq!(pipeline.ledger_failures(), 3);
    }

    #[tokio::test]
    async fn test_output_failure_keeps_usage() {
        let dir = TempDir::new().unwrap();
        let paths = write_sources(dir.path(), &["a.sql"]);
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let mut pipeline =
            DocPipeline::new(settings(&blocker), ScriptedProvider::new(None), MemoryLedger::new());
        assert!(pipeline.process_file(&paths[0]).await.is_err());

        let record = &pipeline.ledger().records().unwrap()[0];
        assert!(!record.success);
        assert_eq!(record.error_kind.as_deref(), Some("io"));
        assert_eq!(record.input_tokens, 1000);
        assert!(record.cost_usd > 0.0);
    }

    #[tokio::test]
    async fn test_unpriced_model_records_zero_cost() {
        let dir = TempDir::new().unwrap();
        let paths = write_sources(dir.path(), &["a.py"]);
        let mut settings = settings(&dir.path().join("out"));
        settings.provider.model = "in-house-model".to_string();

        let mut pipeline =
            DocPipeline::new(settings, ScriptedProvider::new(None), MemoryLedger::new());
        let record = pipeline.process_file(&paths[0]).await.unwrap();

        assert!(record.success);
        assert_eq!(record.cost_usd, 0.0);
        assert!(!record.cost_known);
        assert!(record.pricing.is_none());
        assert_eq!(record.model, "in-house-model");
    }

    #[tokio::test]
    async fn test_get_member_by_id_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/chat/completions"))
            .and(body_string_contains("GetMemberByID.sql"))
            .and(body_string_contains("@MemberID INT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": report_markdown()}}],
                "usage": {"prompt_tokens": 1200, "completion_tokens": 800}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("GetMemberByID.sql");
        fs::write(&source, GET_MEMBER_SQL).unwrap();

        let mut settings = settings(&dir.path().join("output"));
        settings.pdf = true;
        settings.provider.api_key = Some("sk-test".to_string());
        settings.provider.api_base = Some(server.uri());
        let provider = create_provider(&settings.provider).unwrap();
        assert_eq!(provider.name(), "openai");

        let ledger = JsonlLedger::new(dir.path().join(".legacydoc/run_history.jsonl"));
        let mut pipeline = DocPipeline::new(settings, provider, ledger);
        let record = pipeline.process_file(&source).await.unwrap();

        assert!(record.success);
        assert_eq!(record.language, Language::Sql);
        assert_eq!(record.input_tokens, 1200);
        assert_eq!(record.output_tokens, 800);
        assert!(record.cost_usd > 0.0);
        assert!(record.cost_known);

        let markdown_path = record.output_path.clone().unwrap();
        assert_eq!(markdown_path, dir.path().join("output/GetMemberByID.sql.md"));
        let doc = fs::read_to_string(&markdown_path).unwrap();
        assert!(doc.starts_with("# Documentation: GetMemberByID.sql"));

        let mut cursor = 0;
        for header in DOCUMENTATION_SECTIONS {
            let at = doc[cursor..].find(header).unwrap_or_else(|| panic!("missing {header}"));
            cursor += at + header.len();
        }
        assert!(doc.contains("| @MemberID | INT |"));

        let pdf = record.pdf_path.clone().unwrap();
        assert!(fs::read(pdf).unwrap().starts_with(b"%PDF-"));

        let persisted = pipeline.ledger().records().unwrap();
        assert_eq!(persisted, vec![record]);
    }

    #[tokio::test]
    async fn test_provider_status_becomes_failed_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let paths = write_sources(dir.path(), &["a.sql"]);
        let mut settings = settings(&dir.path().join("out"));
        settings.provider.api_base = Some(server.uri());
        let provider = Arc::new(
            OpenAiProvider::new(&ProviderConfig {
                api_key: Some("sk-test".to_string()),
                ..settings.provider.clone()
            })
            .unwrap(),
        );

        let mut pipeline = DocPipeline::new(settings, provider, MemoryLedger::new());
        match pipeline.process_file(&paths[0]).await.unwrap_err() {
            DocError::Provider(e) => assert_eq!(e.category, ErrorCategory::RateLimit),
            other => panic!("expected provider error, got {other:?}"),
        }
        assert_eq!(pipeline.ledger().len(), 1);
    }
}
