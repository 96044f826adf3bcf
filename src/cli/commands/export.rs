//! Export Command
//!
//! Regenerate the CSV projection of the run ledger.

use std::path::{Path, PathBuf};

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::ledger::export_csv;
use crate::types::Result;

pub fn run(output: Option<PathBuf>, config_path: Option<&Path>, out: &Output) -> Result<PathBuf> {
    let ctx = CommandContext::load(config_path)?;
    let ledger = ctx.existing_ledger()?;
    let target = output.unwrap_or_else(|| ctx.config.ledger.export_path.clone());

    let rows = export_csv(&ledger, &target)?;
    out.success(&format!("Exported {} run(s) to {}", rows, target.display()));
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{JsonlLedger, RunLedger, RunRecord};
    use crate::types::{DocError, RunId};
    use figment::Jail;
    use std::time::Duration;

    #[test]
    fn test_export_uses_configured_paths() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            let mut ledger = JsonlLedger::new(".legacydoc/run_history.jsonl");
            let record = RunRecord::begin(RunId::new(), "a.sql", "openai", "gpt-4o-mini")
                .fail(Duration::from_millis(1), &DocError::Config("x".into()));
            ledger.append(&record).unwrap();

            let target = run(None, None, &Output::new(true)).unwrap();
            assert_eq!(target, PathBuf::from(".legacydoc/run_history.csv"));
            let csv = std::fs::read_to_string(&target).unwrap();
            assert_eq!(csv.lines().count(), 2);
            assert!(csv.contains("a.sql"));
            Ok(())
        });
    }

    #[test]
    fn test_export_requires_setup() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            let err = run(None, None, &Output::new(true)).unwrap_err();
            assert!(matches!(err, DocError::NotInitialized));
            Ok(())
        });
    }
}
