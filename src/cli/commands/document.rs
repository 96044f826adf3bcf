//! Document Command
//!
//! Generate documentation for one file or every supported file in a
//! directory.
//!
//! Usage:
//!   legacydoc document <path> [--pdf] [--recursive] [--output DIR]
//!                             [--provider P] [--model M]

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::info;

use crate::ai::provider::create_provider;
use crate::cli::ui::{Output, usd};
use crate::cli::util::CommandContext;
use crate::config::Config;
use crate::pipeline::{BatchReport, DocPipeline, PipelineSettings};
use crate::source::{Language, discover};
use crate::types::{DocError, Result};

/// Document run options (consolidated parameters)
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    pub path: PathBuf,
    pub pdf: bool,
    pub recursive: bool,
    /// Output directory override
    pub output: Option<PathBuf>,
    /// LLM provider override
    pub provider: Option<String>,
    /// Model override
    pub model: Option<String>,
}

impl DocumentOptions {
    /// CLI flags win over every configuration layer
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if self.pdf {
            config.output.pdf = true;
        }
        config.validate()
    }
}

/// Returns `Ok(false)` when some files in a batch failed.
pub fn run(options: DocumentOptions, config_path: Option<&Path>, out: &Output) -> Result<bool> {
    let mut ctx = CommandContext::load(config_path)?;
    options.apply(&mut ctx.config)?;

    let files = collect_inputs(&options.path, options.recursive)?;
    if files.is_empty() {
        out.warning(&format!(
            "No supported code files found in: {}",
            options.path.display()
        ));
        out.info(&format!(
            "Supported extensions: {}",
            Language::supported_extensions().join(", ")
        ));
        return Ok(true);
    }

    let settings = PipelineSettings::from_config(&ctx.config);
    let provider = create_provider(&settings.provider)?;
    let mut pipeline = DocPipeline::new(settings, provider, ctx.ledger());
    info!(
        "Run {} with {} ({})",
        pipeline.run_id(),
        ctx.config.llm.provider,
        ctx.config.llm.model
    );

    let rt = Runtime::new()?;

    if !options.path.is_dir() {
        out.header(&format!("Documenting {}", options.path.display()));
        let record = rt.block_on(pipeline.process_file(&options.path))?;
        out.record(&record);
        if pipeline.ledger_failures() > 0 {
            out.warning("Run could not be written to the ledger (see log)");
        }
        return Ok(true);
    }

    out.header(&format!(
        "Documenting {} file(s) from {}",
        files.len(),
        options.path.display()
    ));
    let report = rt.block_on(pipeline.process_batch(&files));
    for record in &report.outcomes {
        out.record(record);
    }
    print_report(&report, out);

    Ok(report.failed == 0)
}

fn collect_inputs(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        return discover(path, recursive);
    }
    // Let the reader classify missing paths so they still get a run record
    if !path.exists() {
        return Ok(vec![path.to_path_buf()]);
    }
    Err(DocError::Config(format!(
        "Not a file or directory: {}",
        path.display()
    )))
}

fn print_report(report: &BatchReport, out: &Output) {
    out.section("Batch Summary");
    out.kv("Processed", report.files_processed);
    out.kv("Succeeded", report.succeeded);
    out.kv("Failed", report.failed);
    out.kv(
        "Tokens",
        format!(
            "{} in / {} out",
            report.total_input_tokens, report.total_output_tokens
        ),
    );
    out.kv("Cost", usd(report.total_cost_usd));
    if report.ledger_failures > 0 {
        out.warning(&format!(
            "{} run(s) could not be written to the ledger (see log)",
            report.ledger_failures
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let options = DocumentOptions {
            path: PathBuf::from("x.sql"),
            pdf: true,
            output: Some(PathBuf::from("docs")),
            provider: Some("anthropic".to_string()),
            model: Some("claude-sonnet-4".to_string()),
            ..Default::default()
        };
        options.apply(&mut config).unwrap();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.model, "claude-sonnet-4");
        assert_eq!(config.output.dir, PathBuf::from("docs"));
        assert!(config.output.pdf);
    }

    #[test]
    fn test_unknown_provider_flag_rejected() {
        let mut config = Config::default();
        let options = DocumentOptions {
            provider: Some("bard".to_string()),
            ..Default::default()
        };
        assert!(options.apply(&mut config).is_err());
    }

    #[test]
    fn test_collect_inputs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("a.py"), "pass").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_inputs(dir.path(), false).unwrap();
        assert_eq!(files, vec![dir.path().join("a.py"), dir.path().join("b.sql")]);

        let single = collect_inputs(&dir.path().join("notes.txt"), false).unwrap();
        assert_eq!(single.len(), 1);

        let missing = collect_inputs(&dir.path().join("gone.sql"), false).unwrap();
        assert_eq!(missing, vec![dir.path().join("gone.sql")]);
    }
}
