//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/legacydoc/config.toml)
//! 3. Project config (.legacydoc/config.toml)
//! 4. Explicit `--config` file
//! 5. Environment variables (LEGACYDOC_*)
//! 6. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
