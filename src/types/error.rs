//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Kinds
//!
//! - **Read**: file access or decoding failures ([`ReadError`])
//! - **Provider**: network/auth/rate-limit/malformed LLM responses ([`LlmError`])
//! - **Format**: Markdown to document rendering ([`FormatError`])
//! - **LogWrite**: the run ledger is unwritable
//!
//! Provider calls are made exactly once; categories describe what went
//! wrong, they do not drive any retry.

use std::path::{Path, PathBuf};

use thiserror::Error;

// =============================================================================
// Provider Error Categories
// =============================================================================

/// What kind of failure an LLM provider call ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the provider
    RateLimit,
    /// Authentication or authorization failed
    Auth,
    /// Connectivity issues (DNS, refused connection, reset)
    Network,
    /// The request-level timeout elapsed
    Timeout,
    /// The provider answered with something we cannot decode
    Malformed,
    /// The provider rejected the request
    BadRequest,
    /// Provider or model unavailable (5xx, 404)
    Unavailable,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Malformed => write!(f, "MALFORMED"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category and context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// HTTP status, when the provider answered
    pub status: Option<u16>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            status: None,
        }
    }

    /// Create error with provider context
    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            status: None,
        }
    }

    /// Attach the HTTP status the provider answered with
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Shorthand for an undecodable provider response
    pub fn malformed(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::with_provider(ErrorCategory::Malformed, message, provider)
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport failures and HTTP statuses to [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify HTTP status code directly
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 413 | 422 => ErrorCategory::BadRequest,
            404 | 500..=599 => ErrorCategory::Unavailable,
            408 => ErrorCategory::Timeout,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider).status(status)
    }

    /// Classify a failed HTTP round-trip (no usable status)
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let category = if err.is_timeout() {
            ErrorCategory::Timeout
        } else if err.is_connect() || err.is_request() {
            ErrorCategory::Network
        } else if err.is_decode() || err.is_body() {
            ErrorCategory::Malformed
        } else {
            ErrorCategory::Unknown
        };
        LlmError::with_provider(category, format!("{} request failed: {}", provider, err), provider)
    }
}

// =============================================================================
// Read Error
// =============================================================================

/// Why a source file could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    NotFound,
    PermissionDenied,
    /// Not valid UTF-8 text, or binary content
    Decoding,
    Io,
}

impl std::fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Decoding => write!(f, "decoding failure"),
            Self::Io => write!(f, "I/O failure"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.message)
    }
}

impl std::error::Error for ReadError {}

impl ReadError {
    pub fn new(kind: ReadErrorKind, path: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Map an I/O failure while opening or reading `path`
    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ReadErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ReadErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => ReadErrorKind::Decoding,
            _ => ReadErrorKind::Io,
        };
        Self::new(kind, path, err.to_string())
    }
}

// =============================================================================
// Format Error
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// Raw HTML cannot be laid out
    Html,
    /// Images are not embedded
    Image,
    /// More columns than fit across a page
    TableTooWide,
    /// The PDF writer failed
    Render,
}

#[derive(Debug, Clone)]
pub struct FormatError {
    pub kind: FormatErrorKind,
    pub message: String,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FormatError {}

impl FormatError {
    pub fn new(kind: FormatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Read error: {0}")]
    Read(ReadError),

    #[error("Provider error: {0}")]
    Provider(LlmError),

    #[error("Format error: {0}")]
    Format(FormatError),

    #[error("Ledger write error: {0}")]
    LogWrite(String),

    // -------------------------------------------------------------------------
    // Setup Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'legacydoc init' first")]
    NotInitialized,
}

impl From<LlmError> for DocError {
    fn from(err: LlmError) -> Self {
        DocError::Provider(err)
    }
}

impl From<ReadError> for DocError {
    fn from(err: ReadError) -> Self {
        DocError::Read(err)
    }
}

impl From<FormatError> for DocError {
    fn from(err: FormatError) -> Self {
        DocError::Format(err)
    }
}

pub type Result<T> = std::result::Result<T, DocError>;

impl DocError {
    /// Short machine-friendly label, stored alongside failed run records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Provider(_) => "provider",
            Self::Format(_) => "format",
            Self::LogWrite(_) => "log_write",
            Self::Config(_) | Self::NotInitialized => "config",
            Self::Io(_) => "io",
            Self::Json(_) | Self::Yaml(_) | Self::Csv(_) => "serialization",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
