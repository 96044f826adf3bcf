//! Config Command
//!
//! Manage legacydoc configuration.
//!
//! Usage:
//!   legacydoc config show [-g] [-f text|json]
//!   legacydoc config path
//!   legacydoc config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::ConfigLoader;
use crate::types::{DocError, Result};

/// Show configuration
pub fn show(global: bool, format: &str, config_path: Option<&Path>, out: &Output) -> Result<()> {
    let as_json = match format {
        "json" => true,
        "text" | "toml" => false,
        other => {
            return Err(DocError::Config(format!(
                "Unknown format '{}'. Valid values: text, json",
                other
            )));
        }
    };

    if global {
        let Some(global_path) = ConfigLoader::global_config_path() else {
            out.warning("Cannot determine global config directory.");
            return Ok(());
        };
        if !global_path.exists() {
            out.info("No global config found.");
            out.info("Run 'legacydoc config init --global' to create one.");
            return Ok(());
        }
        // Defaults plus the global file, without project or env layers
        let config = ConfigLoader::load_from_file(&global_path)?;
        if !as_json {
            println!("# Global Config: {}\n", global_path.display());
        }
        return ConfigLoader::show_config(&config, as_json);
    }

    let ctx = CommandContext::load(config_path)?;
    ConfigLoader::show_config(&ctx.config, as_json)
}

/// Show configuration paths
pub fn path(config_path: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;
    ConfigLoader::show_path(config_path, &ctx.config.ledger.path);
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool, out: &Output) -> Result<()> {
    let path = ConfigLoader::init_global(force)?;
    out.success("Initialized global configuration");
    out.kv("Config", path.display());
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool, out: &Output) -> Result<()> {
    let created = ConfigLoader::init_project(force)?;
    let path = ConfigLoader::project_config_path();
    if created {
        out.success("Initialized project configuration");
    } else {
        out.info("Project configuration already exists (use --force to overwrite)");
    }
    out.kv("Config", path.display());
    Ok(())
}
