//! CLI Common Utilities
//!
//! Shared configuration and ledger access for command handlers.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::ledger::JsonlLedger;
use crate::types::{DocError, Result};

/// Command execution context
///
/// Resolved configuration plus the explicit `--config` path it came from.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            config: ConfigLoader::load(config_path)?,
            config_path: config_path.map(Path::to_path_buf),
        })
    }

    pub fn ledger(&self) -> JsonlLedger {
        JsonlLedger::new(&self.config.ledger.path)
    }

    /// Ledger for read-only commands. Errors when nothing was ever set up.
    pub fn existing_ledger(&self) -> Result<JsonlLedger> {
        let ledger = self.ledger();
        if !ledger.path().exists() && !is_initialized() {
            return Err(DocError::NotInitialized);
        }
        Ok(ledger)
    }
}

/// Project directory exists (created by `init` or by the first run)
pub fn is_initialized() -> bool {
    ConfigLoader::project_dir().exists()
}
