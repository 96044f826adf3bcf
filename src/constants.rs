//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Project-local paths
pub mod paths {
    /// Project data directory (ledger, project config)
    pub const PROJECT_DIR: &str = ".legacydoc";

    /// Config file name inside the project and global directories
    pub const CONFIG_FILE: &str = "config.toml";

    /// Application directory name under `$XDG_CONFIG_HOME`
    pub const APP_NAME: &str = "legacydoc";

    /// Default documentation output directory
    pub const DEFAULT_OUTPUT_DIR: &str = "output";
}

/// LLM defaults
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "openai";

    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Low temperature keeps reports stable between runs
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;

    /// Maximum tokens the model may generate per file
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
}

/// Prompt construction
pub mod prompt {
    /// Default source character budget per request
    pub const DEFAULT_MAX_CHARS: usize = 60_000;

    /// Appended after the kept prefix when the source exceeds the budget
    pub const TRUNCATION_MARKER: &str =
        "\n\n... [TRUNCATED: source exceeds the prompt budget; remaining content omitted] ...";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}

/// Run ledger
pub mod ledger {
    /// Append-only ledger file (relative to the project directory)
    pub const FILE_NAME: &str = "run_history.jsonl";

    /// Default tabular export file (relative to the project directory)
    pub const EXPORT_FILE_NAME: &str = "run_history.csv";
}

/// PDF page geometry and typography (millimetres / points)
pub mod pdf {
    /// A4 portrait
    pub const PAGE_WIDTH_MM: f32 = 210.0;
    pub const PAGE_HEIGHT_MM: f32 = 297.0;

    pub const MARGIN_LEFT_MM: f32 = 20.0;
    pub const MARGIN_RIGHT_MM: f32 = 20.0;
    /// Body starts below the running header
    pub const MARGIN_TOP_MM: f32 = 28.0;
    /// Body stops above the footer
    pub const MARGIN_BOTTOM_MM: f32 = 22.0;

    /// Running header text printed on every page
    pub const HEADER_TEXT: &str = "Legacy Code Documentation";

    /// Widest table rendered as a grid
    pub const MAX_TABLE_COLUMNS: usize = 8;

    /// Table cells are clipped to this many wrapped lines
    pub const MAX_CELL_LINES: usize = 6;

    /// Points to millimetres
    pub const PT_TO_MM: f32 = 0.352_778;
}
