use super::{RunLedger, RunRecord};
use crate::types::{DocError, Result};

/// In-process ledger for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    records: Vec<RunRecord>,
    reject_writes: bool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose every append fails, for exercising the fallback path
    pub fn unwritable() -> Self {
        Self {
            records: Vec::new(),
            reject_writes: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RunLedger for MemoryLedger {
    fn append(&mut self, record: &RunRecord) -> Result<()> {
        if self.reject_writes {
            return Err(DocError::LogWrite("memory ledger is read-only".to_string()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<RunRecord>> {
        Ok(self.records.clone())
    }
}
