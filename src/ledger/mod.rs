//! Run Ledger
//!
//! Append-only history of file-processing attempts with cost accounting.
//!
//! - `jsonl`: the on-disk ledger (source of truth)
//! - `memory`: in-process ledger
//! - `summary`: pure aggregation over records
//! - `export`: CSV projection
//!
//! A single process writes the ledger at a time. Concurrent writers would
//! need one owning writer task.

mod export;
mod jsonl;
mod memory;
mod record;
mod summary;

pub use export::export_csv;
pub use jsonl::JsonlLedger;
pub use memory::MemoryLedger;
pub use record::RunRecord;
pub use summary::{GroupTotals, LedgerSummary};

use crate::types::Result;

pub trait RunLedger {
    /// Persist one record. Failures are `DocError::LogWrite`.
    fn append(&mut self, record: &RunRecord) -> Result<()>;

    /// Every record in append order
    fn records(&self) -> Result<Vec<RunRecord>>;

    fn summarize(&self) -> Result<LedgerSummary> {
        Ok(LedgerSummary::from_records(&self.records()?))
    }
}
