//! Language Detection
//!
//! **Single source of truth** for mapping file extensions to language tags.
//! The tag is what gets embedded in prompts and stored in run records.
//!
//! ```rust,ignore
//! use legacydoc::source::Language;
//!
//! let lang = Language::from_path("procs/GetMemberByID.sql");
//! assert_eq!(lang, Language::Sql);
//! assert_eq!(lang.tag(), "sql");
//! assert!(lang.has_data_relationships());
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Language Metadata Table
// =============================================================================

struct LanguageMeta {
    /// Human-readable name used in prompts
    display_name: &'static str,
    /// Stable lowercase tag (ledger, CLI, serde)
    tag: &'static str,
    /// Identifier for Markdown code fences
    fence: &'static str,
    /// File extensions (lowercase, no dot)
    extensions: &'static [&'static str],
    /// Whether the "Data Relationships" section applies
    data_relationships: bool,
}

macro_rules! lang_meta {
    ($display:literal, $tag:literal, $fence:literal, [$($ext:literal),*], $rel:literal $(,)?) => {
        LanguageMeta {
            display_name: $display,
            tag: $tag,
            fence: $fence,
            extensions: &[$($ext),*],
            data_relationships: $rel,
        }
    };
}

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            // Data languages
            Language::Sql => lang_meta!("SQL", "sql", "sql", ["sql"], true),
            Language::Dax => lang_meta!("DAX", "dax", "dax", ["dax", "m"], true),

            // General purpose
            Language::Python => lang_meta!("Python", "python", "python", ["py"], false),
            Language::Cpp => lang_meta!(
                "C++",
                "cpp",
                "cpp",
                ["cpp", "cc", "cxx", "h", "hpp"],
                false,
            ),
            Language::C => lang_meta!("C", "c", "c", ["c"], false),
            Language::CSharp => lang_meta!("C#", "csharp", "csharp", ["cs"], false),
            Language::Java => lang_meta!("Java", "java", "java", ["java"], false),
            Language::JavaScript => lang_meta!(
                "JavaScript",
                "javascript",
                "javascript",
                ["js"],
                false,
            ),
            Language::TypeScript => lang_meta!(
                "TypeScript",
                "typescript",
                "typescript",
                ["ts"],
                false,
            ),
            Language::Rust => lang_meta!("Rust", "rust", "rust", ["rs"], false),
            Language::Go => lang_meta!("Go", "go", "go", ["go"], false),

            // Legacy
            Language::VisualBasic => lang_meta!(
                "Visual Basic",
                "visualbasic",
                "vb",
                ["vb", "bas", "cls"],
                false,
            ),
            Language::Cobol => lang_meta!("COBOL", "cobol", "cobol", ["cbl", "cob"], false),

            // Scripting
            Language::Shell => lang_meta!("Shell", "shell", "bash", ["sh"], false),
            Language::PowerShell => lang_meta!(
                "PowerShell",
                "powershell",
                "powershell",
                ["ps1"],
                false,
            ),

            Language::Unknown => lang_meta!("Unknown", "unknown", "text", [], false),
        }
    }
}

// =============================================================================
// Language Enum
// =============================================================================

/// Languages the documentation prompt knows how to describe.
///
/// Anything else maps to [`Language::Unknown`], which is still documentable
/// but gets no language-specific prompt sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Sql,
    Dax,
    Python,
    Cpp,
    C,
    CSharp,
    Java,
    JavaScript,
    TypeScript,
    Rust,
    Go,
    VisualBasic,
    Cobol,
    Shell,
    PowerShell,
    #[default]
    Unknown,
}

impl Language {
    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        self.meta().display_name
    }

    /// Stable lowercase tag
    pub fn tag(&self) -> &'static str {
        self.meta().tag
    }

    /// Markdown code fence identifier
    pub fn fence(&self) -> &'static str {
        self.meta().fence
    }

    /// Extensions mapped to this language
    pub fn extensions(&self) -> &'static [&'static str] {
        self.meta().extensions
    }

    /// SQL and DAX get the join-by-join "Data Relationships" section
    pub fn has_data_relationships(&self) -> bool {
        self.meta().data_relationships
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Detect language from file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Self {
        let ext_lower = ext.trim_start_matches('.').to_lowercase();

        Self::all_variants()
            .iter()
            .find(|lang| lang.meta().extensions.contains(&ext_lower.as_str()))
            .copied()
            .unwrap_or(Language::Unknown)
    }

    /// Detect language from file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// All known languages (excludes `Unknown`)
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Sql, Language::Dax, Language::Python, Language::Cpp,
            Language::C, Language::CSharp, Language::Java, Language::JavaScript,
            Language::TypeScript, Language::Rust, Language::Go,
            Language::VisualBasic, Language::Cobol, Language::Shell,
            Language::PowerShell,
        ]
    }

    /// Every supported extension, for help text
    pub fn supported_extensions() -> Vec<&'static str> {
        Self::all_variants()
            .iter()
            .flat_map(|lang| lang.extensions().iter().copied())
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_lower = s.to_lowercase();
        if s_lower == "unknown" {
            return Ok(Language::Unknown);
        }

        Self::all_variants()
            .iter()
            .find(|lang| {
                let meta = lang.meta();
                meta.tag == s_lower || meta.display_name.to_lowercase() == s_lower
            })
            .copied()
            .ok_or_else(|| format!("Unknown language: {}", s))
    }
}
