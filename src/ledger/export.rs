//! Tabular Export
//!
//! Regenerates a CSV projection of the ledger. The JSONL file stays the
//! source of truth; the CSV is rewritten in full on every export.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::{RunLedger, RunRecord};
use crate::types::Result;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Run ID")]
    run_id: String,
    #[serde(rename = "File")]
    file: String,
    #[serde(rename = "Language")]
    language: &'a str,
    #[serde(rename = "Provider")]
    provider: &'a str,
    #[serde(rename = "Model")]
    model: &'a str,
    #[serde(rename = "Input Tokens")]
    input_tokens: u32,
    #[serde(rename = "Output Tokens")]
    output_tokens: u32,
    #[serde(rename = "Total Tokens")]
    total_tokens: u64,
    #[serde(rename = "Cost (USD)")]
    cost_usd: String,
    #[serde(rename = "Success")]
    success: &'static str,
    #[serde(rename = "Error")]
    error: &'a str,
    #[serde(rename = "Duration (ms)")]
    duration_ms: u64,
    #[serde(rename = "Output Path")]
    output_path: String,
    #[serde(rename = "PDF Path")]
    pdf_path: String,
}

impl<'a> From<&'a RunRecord> for ExportRow<'a> {
    fn from(r: &'a RunRecord) -> Self {
        Self {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            run_id: r.run_id.to_string(),
            file: r.file_path.display().to_string(),
            language: r.language.tag(),
            provider: &r.provider,
            model: &r.model,
            input_tokens: r.input_tokens,
            output_tokens: r.output_tokens,
            total_tokens: r.total_tokens(),
            cost_usd: format!("{:.6}", r.cost_usd),
            success: if r.success { "Yes" } else { "No" },
            error: r.error.as_deref().unwrap_or(""),
            duration_ms: r.duration_ms,
            output_path: r
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            pdf_path: r
                .pdf_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Write every ledger record to `path` as CSV. Returns the row count.
pub fn export_csv<L: RunLedger + ?Sized>(ledger: &L, path: &Path) -> Result<usize> {
    let records = ledger.records()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        // serde only emits headers alongside the first row
        writer.write_record(HEADERS)?;
    }
    for record in &records {
        writer.serialize(ExportRow::from(record))?;
    }
    writer.flush()?;

    info!("Exported {} run records to {}", records.len(), path.display());
    Ok(records.len())
}

const HEADERS: [&str; 15] = [
    "Timestamp",
    "Run ID",
    "File",
    "Language",
    "Provider",
    "Model",
    "Input Tokens",
    "Output Tokens",
    "Total Tokens",
    "Cost (USD)",
    "Success",
    "Error",
    "Duration (ms)",
    "Output Path",
    "PDF Path",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::types::{DocError, RunId};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let mut ledger = MemoryLedger::new();
        ledger
            .append(
                &RunRecord::begin(RunId::new(), "/src/a.sql", "openai", "gpt-4o-mini").succeed(
                    Duration::from_millis(40),
                    PathBuf::from("output/a.sql.md"),
                    None,
                ),
            )
            .unwrap();
        ledger
            .append(
                &RunRecord::begin(RunId::new(), "/src/b.exe", "openai", "gpt-4o-mini")
                    .fail(Duration::from_millis(1), &DocError::Config("bad, \"quoted\"".into())),
            )
            .unwrap();

        let path = dir.path().join("exports/history.csv");
        assert_eq!(export_csv(&ledger, &path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADERS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "sql");
        assert_eq!(&rows[0][10], "Yes");
        assert_eq!(&rows[1][10], "No");
        assert!(rows[1][11].contains("\"quoted\""));
    }

    #[test]
    fn test_empty_ledger_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.csv");
        assert_eq!(export_csv(&MemoryLedger::new(), &path).unwrap(), 0);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Timestamp,Run ID"));
    }
}
