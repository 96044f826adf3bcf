//! Document Formatting
//!
//! Markdown to paginated PDF: `markdown` parses, `layout` paginates, `pdf`
//! writes bytes. Unrenderable constructs degrade to raw text rather than
//! failing the document; only a writer failure is an error.

pub mod layout;
pub mod markdown;
pub mod pdf;

pub use layout::{StyledDocument, paginate, sanitize_latin1};
pub use markdown::{Block, ParsedMarkdown, parse};

use tracing::{debug, warn};

use crate::types::{FormatError, Result};

/// Rendered PDF plus the constructs that were downgraded to plain text
#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub fallbacks: Vec<FormatError>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFormatter;

impl DocumentFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn markdown_to_pdf(&self, markdown: &str, title: &str) -> Result<PdfOutput> {
        let parsed = markdown::parse(markdown);
        for fallback in &parsed.fallbacks {
            warn!("{}: rendered as plain text ({})", title, fallback);
        }

        let styled = layout::paginate(&parsed.blocks);
        let bytes = pdf::render(&styled, title)?;
        debug!(
            "Rendered {} ({} pages, {} bytes)",
            title,
            styled.page_count(),
            bytes.len()
        );

        Ok(PdfOutput {
            bytes,
            pages: styled.page_count(),
            fallbacks: parsed.fallbacks,
        })
    }
}
