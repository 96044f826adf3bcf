use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RunRecord;

/// Count and cost for one language or model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupTotals {
    pub count: usize,
    pub cost_usd: f64,
}

/// Aggregate view over a ledger. Costs are the ones recorded at call
/// time; nothing is re-priced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_usd: f64,
    /// Runs whose model had no pricing
    pub unpriced_runs: usize,
    pub by_language: BTreeMap<String, GroupTotals>,
    pub by_model: BTreeMap<String, GroupTotals>,
    pub first_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
}

impl LedgerSummary {
    pub fn from_records(records: &[RunRecord]) -> Self {
        let mut summary = Self::default();

        for record in records {
            summary.total_runs += 1;
            if record.success {
                summary.successful_runs += 1;
            } else {
                summary.failed_runs += 1;
            }
            summary.total_input_tokens += record.input_tokens as u64;
            summary.total_output_tokens += record.output_tokens as u64;
            summary.total_cost_usd += record.cost_usd;

            // Failed reads never reach a model; they are not "unpriced"
            if record.success && !record.cost_known {
                summary.unpriced_runs += 1;
            }

            let lang = summary
                .by_language
                .entry(record.language.tag().to_string())
                .or_default();
            lang.count += 1;
            lang.cost_usd += record.cost_usd;

            let model = summary.by_model.entry(record.model.clone()).or_default();
            model.count += 1;
            model.cost_usd += record.cost_usd;

            summary.first_run = Some(match summary.first_run {
                Some(t) => t.min(record.timestamp),
                None => record.timestamp,
            });
            summary.last_run = Some(match summary.last_run {
                Some(t) => t.max(record.timestamp),
                None => record.timestamp,
            });
        }

        summary
    }

    pub fn is_empty(&self) -> bool {
        self.total_runs == 0
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}
