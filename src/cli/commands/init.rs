//! Init Command
//!
//! Initialize legacydoc in the current directory.

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::{DocError, Result};

pub fn run(force: bool, out: &Output) -> Result<()> {
    if ConfigLoader::is_project_initialized() && !force {
        return Err(DocError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project(force)?;

    // Global config is a convenience; never overwrite it from here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    out.success(&format!(
        "Initialized legacydoc in {}/",
        ConfigLoader::project_dir().display()
    ));
    out.kv("Config", ConfigLoader::project_config_path().display());
    out.info("Next: set OPENAI_API_KEY (or ANTHROPIC_API_KEY) and run 'legacydoc document <path>'");

    Ok(())
}
