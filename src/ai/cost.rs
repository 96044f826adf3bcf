//! Cost Estimation
//!
//! Per-model USD rates per 1K tokens. The table is built once from
//! configuration and never mutated; unpriced models cost zero and are
//! flagged rather than failing the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rate pair in USD per 1K tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelRate {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

const DEFAULT_RATES: &[(&str, ModelRate)] = &[
    ("gpt-4o-mini", ModelRate::new(0.00015, 0.0006)),
    ("gpt-4o", ModelRate::new(0.005, 0.015)),
    ("gemini/gemini-1.5-flash", ModelRate::new(0.000075, 0.0003)),
    ("gemini/gemini-1.5-pro", ModelRate::new(0.00125, 0.005)),
    ("claude-sonnet-4-20250514", ModelRate::new(0.003, 0.015)),
    ("claude-opus-4-20250514", ModelRate::new(0.015, 0.075)),
];

/// Model id to rate. Serializes as a plain TOML table under `[pricing]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable(BTreeMap<String, ModelRate>);

impl Default for CostTable {
    fn default() -> Self {
        Self(
            DEFAULT_RATES
                .iter()
                .map(|(model, rate)| (model.to_string(), *rate))
                .collect(),
        )
    }
}

impl CostTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    #[cfg(test)]
    pub fn with_rate(mut self, model: impl Into<String>, rate: ModelRate) -> Self {
        self.0.insert(model.into(), rate);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelRate> {
        self.0.get(model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelRate)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cost of one call and the rate it was computed with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub usd: f64,
    pub rate: Option<ModelRate>,
    pub known: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    table: CostTable,
}

impl CostCalculator {
    pub fn new(table: CostTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CostTable {
        &self.table
    }

    pub fn calculate(&self, model: &str, input_tokens: u32, output_tokens: u32) -> CostEstimate {
        match self.table.get(model) {
            Some(rate) => CostEstimate {
                usd: rate.cost(input_tokens, output_tokens),
                rate: Some(*rate),
                known: true,
            },
            None => {
                warn!("No pricing for model '{}'; recording cost as 0", model);
                CostEstimate {
                    usd: 0.0,
                    rate: None,
                    known: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_rates() {
        let calc = CostCalculator::default();
        let est = calc.calculate("gpt-4o-mini", 1000, 1000);
        assert!(est.known);
        assert!((est.usd - 0.00075).abs() < 1e-12);
        assert_eq!(est.rate, Some(ModelRate::new(0.00015, 0.0006)));
        assert_eq!(calc.table().len(), 6);
    }

    #[test]
    fn test_unknown_model_is_zero_and_flagged() {
        let est = CostCalculator::default().calculate("llama3:latest", 5000, 5000);
        assert_eq!(est.usd, 0.0);
        assert!(!est.known);
        assert!(est.rate.is_none());
    }

    #[test]
    fn test_overrides_extend_table() {
        let table = CostTable::default().with_rate("local-coder", ModelRate::new(0.0, 0.0));
        let calc = CostCalculator::new(table);
        assert!(calc.calculate("local-coder", 10, 10).known);
    }

    #[test]
    fn test_table_toml_shape() {
        let table = CostTable::empty().with_rate("gpt-4o", ModelRate::new(0.005, 0.015));
        let text = toml::to_string(&table).unwrap();
        assert!(text.contains("[gpt-4o]"));
        let back: CostTable = toml::from_str(&text).unwrap();
        assert_eq!(back, table);
    }

    proptest! {
        #[test]
        fn prop_priced_cost_formula(
            input in 0u32..2_000_000,
            output in 0u32..2_000_000,
            in_rate in 0.0f64..0.1,
            out_rate in 0.0f64..0.1,
        ) {
            let calc = CostCalculator::new(
                CostTable::empty().with_rate("m", ModelRate::new(in_rate, out_rate)),
            );
            let est = calc.calculate("m", input, output);
            let expected = input as f64 / 1000.0 * in_rate + output as f64 / 1000.0 * out_rate;
            prop_assert!(est.known);
            prop_assert!((est.usd - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn prop_unpriced_is_zero(model in "[a-z]{3,12}-unpriced", input in any::<u32>(), output in any::<u32>()) {
            let est = CostCalculator::default().calculate(&model, input, output);
            prop_assert_eq!(est.usd, 0.0);
            prop_assert!(!est.known);
        }
    }
}
