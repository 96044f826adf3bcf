//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/legacydoc/config.toml)
//! 3. Project config (.legacydoc/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (LEGACYDOC_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::paths;
use crate::types::{DocError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → explicit file → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DocError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        // First underscore separates the section: LEGACYDOC_LLM_MAX_TOKENS -> llm.max_tokens
        figment = figment.merge(
            Env::prefixed("LEGACYDOC_").map(|key| key.as_str().replacen('_', ".", 1).into()),
        );

        let config: Config = figment
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/legacydoc/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(paths::APP_NAME))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(paths::CONFIG_FILE))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(paths::PROJECT_DIR)
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join(paths::CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(explicit: Option<&Path>, ledger: &Path) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            println!("  Global:  {} {}", mark(&global), global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        println!("  Project: {} {}", mark(&project), project.display());

        if let Some(path) = explicit {
            println!("  Custom:  {} {}", mark(path), path.display());
        }

        println!("  Ledger:  {} {}", mark(ledger), ledger.display());
    }

    /// Show current effective configuration
    pub fn show_config(config: &Config, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| DocError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DocError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join(paths::CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Initialize project configuration. Returns `false` when a config
    /// already existed and `force` was not set.
    pub fn init_project(force: bool) -> Result<bool> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = Self::project_config_path();
        if config_path.exists() && !force {
            info!("Project config exists: {}", config_path.display());
            return Ok(false);
        }

        fs::write(&config_path, Self::default_project_config())?;
        info!("Created project config: {}", config_path.display());
        Ok(true)
    }

    pub fn is_project_initialized() -> bool {
        Self::project_config_path().exists()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# legacydoc Global Configuration
# User-wide defaults. Project settings in .legacydoc/config.toml override these.
# API keys are read from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY or LEGACYDOC_LLM_API_KEY.

version = "1.0"

[llm]
provider = "openai"
model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 4096
timeout_secs = 120
"#
        .to_string()
    }

    fn default_project_config() -> String {
        r#"# legacydoc Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[llm]
# provider = "anthropic"
# model = "claude-sonnet-4-20250514"
# api_base = "http://localhost:11434"

[prompt]
max_chars = 60000

[output]
dir = "output"
pdf = false

[ledger]
path = ".legacydoc/run_history.jsonl"
export_path = ".legacydoc/run_history.csv"

# USD per 1K tokens; extends the built-in table
# [pricing.my-gateway-model]
# input_per_1k = 0.0005
# output_per_1k = 0.0015
"#
        .to_string()
    }
}

fn mark(path: &Path) -> &'static str {
    if path.exists() { "✓" } else { "✗" }
}
