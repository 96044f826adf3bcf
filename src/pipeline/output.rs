//! Documentation Output
//!
//! Writes `<input file name>.md` and, when enabled, `<input file name>.pdf`
//! into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::document::DocumentFormatter;
use crate::types::Result;

/// Paths produced for one documented file
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenOutput {
    pub markdown_path: PathBuf,
    /// `None` when PDF output is off or rendering failed
    pub pdf_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    pdf: bool,
    formatter: DocumentFormatter,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, pdf: bool) -> Self {
        Self {
            dir: dir.into(),
            pdf,
            formatter: DocumentFormatter::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn markdown_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{}.md", file_name))
    }

    pub fn pdf_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{}.pdf", file_name))
    }

    /// Write the Markdown document. PDF problems are logged and reported as
    /// a missing `pdf_path`; only the Markdown write can fail.
    pub fn write(&self, file_name: &str, body: &str) -> Result<WrittenOutput> {
        fs::create_dir_all(&self.dir)?;

        let document = compose(file_name, body, Utc::now());
        let markdown_path = self.markdown_path(file_name);
        fs::write(&markdown_path, &document)?;
        debug!("Wrote {}", markdown_path.display());

        let pdf_path = if self.pdf {
            self.write_pdf(file_name, &document)
        } else {
            None
        };

        Ok(WrittenOutput {
            markdown_path,
            pdf_path,
        })
    }

    fn write_pdf(&self, file_name: &str, document: &str) -> Option<PathBuf> {
        let path = self.pdf_path(file_name);
        let rendered = match self.formatter.markdown_to_pdf(document, file_name) {
            Ok(out) => out,
            Err(e) => {
                error!("PDF generation failed for {}: {}", file_name, e);
                return None;
            }
        };

        match fs::write(&path, &rendered.bytes) {
            Ok(()) => {
                debug!("Wrote {} ({} pages)", path.display(), rendered.pages);
                Some(path)
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Title, generation time and a rule ahead of the model's report
pub fn compose(file_name: &str, body: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "# Documentation: {}\n\n*Generated: {}*\n\n---\n\n{}",
        file_name,
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_compose_header() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let doc = compose("calc.py", "## 1. Overview\n", at);
        assert_eq!(
            doc,
            "# Documentation: calc.py\n\n*Generated: 2024-03-01 09:30:00 UTC*\n\n---\n\n## 1. Overview\n"
        );
    }

    #[test]
    fn test_write_markdown_only() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path().join("out"), false);
        let written = writer.write("GetMemberByID.sql", "## 1. Overview\n").unwrap();

        assert_eq!(written.markdown_path, dir.path().join("out/GetMemberByID.sql.md"));
        assert!(written.pdf_path.is_none());
        let text = fs::read_to_string(&written.markdown_path).unwrap();
        assert!(text.starts_with("# Documentation: GetMemberByID.sql\n"));
    }

    #[test]
    fn test_write_with_pdf() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path(), true);
        let written = writer.write("calc.py", "## 1. Overview\n\nComputes interest.\n").unwrap();

        let pdf = written.pdf_path.unwrap();
        assert_eq!(pdf, dir.path().join("calc.py.pdf"));
        assert!(fs::read(&pdf).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let writer = OutputWriter::new(&blocker, false);
        assert!(writer.write("a.sql", "body").is_err());
    }
}
