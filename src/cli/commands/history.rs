//! History Command
//!
//! Summarize the run ledger.
//!
//! Usage:
//!   legacydoc history [-f text|json|yaml] [--recent N]

use std::path::Path;

use serde::Serialize;

use crate::cli::ui::{Output, usd};
use crate::cli::util::CommandContext;
use crate::ledger::{LedgerSummary, RunLedger, RunRecord};
use crate::types::{DocError, Result};

#[derive(Serialize)]
struct HistoryView<'a> {
    ledger: String,
    summary: &'a LedgerSummary,
    recent: &'a [RunRecord],
}

pub fn run(format: &str, recent: usize, config_path: Option<&Path>, out: &Output) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    let ledger = ctx.existing_ledger()?;
    let summary = ledger.summarize()?;
    let records = ledger.records()?;
    let recent_records = &records[records.len().saturating_sub(recent)..];

    let view = HistoryView {
        ledger: ledger.path().display().to_string(),
        summary: &summary,
        recent: recent_records,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&view)?),
        "yaml" => print!("{}", serde_yaml::to_string(&view)?),
        "text" => print_text(&summary, recent_records, ledger.path(), out),
        other => {
            return Err(DocError::Config(format!(
                "Unknown format '{}'. Valid values: text, json, yaml",
                other
            )));
        }
    }

    Ok(())
}

fn print_text(summary: &LedgerSummary, recent: &[RunRecord], path: &Path, out: &Output) {
    out.header("Run History Summary");

    if summary.is_empty() {
        out.info("No runs recorded yet.");
        return;
    }

    out.kv("Total runs", summary.total_runs);
    out.kv("Successful", summary.successful_runs);
    out.kv("Failed", summary.failed_runs);
    out.kv(
        "Total tokens",
        format!(
            "{} in / {} out",
            summary.total_input_tokens, summary.total_output_tokens
        ),
    );
    out.kv("Total cost", usd(summary.total_cost_usd));
    if summary.unpriced_runs > 0 {
        out.kv("Unpriced runs", summary.unpriced_runs);
    }
    if let (Some(first), Some(last)) = (summary.first_run, summary.last_run) {
        out.kv(
            "Date range",
            format!(
                "{} .. {}",
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            ),
        );
    }

    out.section("By Language");
    for (language, totals) in &summary.by_language {
        out.kv(
            language,
            format!("{} files ({})", totals.count, usd(totals.cost_usd)),
        );
    }

    out.section("By Model");
    for (model, totals) in &summary.by_model {
        out.kv(model, format!("{} runs ({})", totals.count, usd(totals.cost_usd)));
    }

    if !recent.is_empty() {
        out.section("Recent Runs");
        for record in recent {
            let status = if record.success { "ok" } else { "failed" };
            out.kv(
                &record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                format!(
                    "{} [{}] {} {}",
                    record.file_path.display(),
                    record.model,
                    status,
                    usd(record.cost_usd)
                ),
            );
        }
    }

    out.kv("Ledger", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use figment::Jail;

    #[test]
    fn test_history_formats() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            ConfigLoader::init_project(false).unwrap();
            let out = Output::new(true);

            run("text", 10, None, &out).unwrap();
            run("json", 10, None, &out).unwrap();
            run("yaml", 10, None, &out).unwrap();
            assert!(run("xml", 10, None, &out).is_err());
            Ok(())
        });
    }
}
