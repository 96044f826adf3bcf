use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::cost::{CostEstimate, ModelRate};
use crate::ai::provider::TokenUsage;
use crate::source::Language;
use crate::types::{DocError, RunId};

/// One file-processing attempt. Written once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub run_id: RunId,
    pub file_path: PathBuf,
    pub language: Language,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    /// Rate in effect when the call was made; absent for unpriced models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelRate>,
    #[serde(default)]
    pub cost_known: bool,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Short error class ("read", "provider", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub duration_ms: u64,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub pdf_path: Option<PathBuf>,
}

impl RunRecord {
    /// Start a record for `file_path`. Language comes from the extension so
    /// a file that cannot be read still gets a tag.
    pub fn begin(
        run_id: RunId,
        file_path: impl AsRef<Path>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        Self {
            timestamp: Utc::now(),
            run_id,
            language: Language::from_path(&file_path),
            file_path,
            provider: provider.into(),
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            pricing: None,
            cost_known: false,
            success: false,
            error: None,
            error_kind: None,
            duration_ms: 0,
            output_path: None,
            pdf_path: None,
        }
    }

    /// Identity of the file as read: canonical path and detected language
    pub fn with_source(mut self, file_path: PathBuf, language: Language) -> Self {
        self.file_path = file_path;
        self.language = language;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage, estimate: CostEstimate) -> Self {
        self.input_tokens = usage.input_tokens;
        self.output_tokens = usage.output_tokens;
        self.cost_usd = estimate.usd;
        self.pricing = estimate.rate;
        self.cost_known = estimate.known;
        self
    }

    pub fn succeed(
        mut self,
        elapsed: Duration,
        output_path: PathBuf,
        pdf_path: Option<PathBuf>,
    ) -> Self {
        self.success = true;
        self.error = None;
        self.error_kind = None;
        self.duration_ms = elapsed.as_millis() as u64;
        self.output_path = Some(output_path);
        self.pdf_path = pdf_path;
        self
    }

    pub fn fail(mut self, elapsed: Duration, error: &DocError) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self.error_kind = Some(error.kind().to_string());
        self.duration_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens as u64 + self.output_tokens as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReadError, ReadErrorKind};

    #[test]
    fn test_failed_record_keeps_language_and_error() {
        let err: DocError = ReadError::new(
            ReadErrorKind::Decoding,
            Path::new("/bin/tool.exe"),
            "binary",
        )
        .into();
        let record = RunRecord::begin(RunId::new(), "/bin/tool.exe", "openai", "gpt-4o-mini")
            .fail(Duration::from_millis(3), &err);

        assert!(!record.success);
        assert_eq!(record.language, Language::Unknown);
        assert_eq!(record.error_kind.as_deref(), Some("read"));
        assert!(record.error.as_deref().unwrap_or_default().contains("tool.exe"));
        assert_eq!(record.cost_usd, 0.0);
    }

    #[test]
    fn test_json_line_shape() {
        let record = RunRecord::begin(RunId::new(), "/src/a.sql", "openai", "gpt-4o-mini")
            .with_usage(
                TokenUsage::new(1000, 500),
                CostEstimate {
                    usd: 0.00045,
                    rate: Some(ModelRate::new(0.00015, 0.0006)),
                    known: true,
                },
            )
            .succeed(
                Duration::from_millis(1200),
                PathBuf::from("output/a.sql.md"),
                None,
            );

        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"language\":\"sql\""));
        assert!(line.contains("\"input_per_1k\":0.00015"));

        let back: RunRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.total_tokens(), 1500);
    }
}
