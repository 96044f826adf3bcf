use console::style;

use crate::ledger::RunRecord;

/// Styled terminal output. `quiet` keeps errors and warnings only.
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold().underlined());
        }
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold());
            println!("{}", "─".repeat(40));
        }
    }

    /// Aligned `label value` line
    pub fn kv(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("  {:<16} {}", style(label).dim(), value);
        }
    }

    /// One line per processed file
    pub fn record(&self, record: &RunRecord) {
        let name = record.file_path.display();
        if record.success {
            let target = record
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.success(&format!(
                "{} ({}) {} in / {} out, {} -> {}",
                name,
                record.language,
                record.input_tokens,
                record.output_tokens,
                usd(record.cost_usd),
                target
            ));
            if let Some(pdf) = &record.pdf_path {
                self.kv("PDF", pdf.display());
            }
        } else {
            self.error(&format!(
                "{}: {}",
                name,
                record.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}

pub fn usd(amount: f64) -> String {
    format!("${:.4}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_format() {
        assert_eq!(usd(0.0), "$0.0000");
        assert_eq!(usd(0.00066), "$0.0007");
        assert_eq!(usd(12.5), "$12.5000");
    }
}
