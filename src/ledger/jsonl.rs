//! JSONL Ledger
//!
//! One JSON object per line, append-only. Each append opens the file in
//! append mode and writes the whole line in a single `write_all`, so a
//! crash can lose at most the line being written.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{RunLedger, RunRecord};
use crate::types::{DocError, Result};

#[derive(Debug, Clone)]
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, err: std::io::Error) -> DocError {
        DocError::LogWrite(format!("{}: {}", self.path.display(), err))
    }
}

impl RunLedger for JsonlLedger {
    fn append(&mut self, record: &RunRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| DocError::LogWrite(format!("cannot encode run record: {}", e)))?;
        line.push('\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.write_error(e))?;
        file.flush().map_err(|e| self.write_error(e))?;

        debug!("Appended run record for {}", record.file_path.display());
        Ok(())
    }

    fn records(&self) -> Result<Vec<RunRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed ledger line {} in {}: {}",
                    idx + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        Ok(records)
    }
}
