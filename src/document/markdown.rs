//! Markdown Parsing
//!
//! Flattens CommonMark (plus tables) into the small block vocabulary the
//! page layout understands. Constructs that cannot be laid out (raw HTML,
//! images, over-wide tables) turn the enclosing top-level block into a
//! plain-text block of its raw source, and the reason is kept in
//! [`ParsedMarkdown::fallbacks`].

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::constants::pdf::MAX_TABLE_COLUMNS;
use crate::types::{FormatError, FormatErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    /// `italic` when the whole paragraph is emphasized
    Paragraph { text: String, italic: bool },
    ListItem {
        depth: usize,
        marker: String,
        text: String,
    },
    Code { lines: Vec<String> },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Rule,
    /// Raw source of a block that could not be rendered
    PlainText { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct ParsedMarkdown {
    pub blocks: Vec<Block>,
    pub fallbacks: Vec<FormatError>,
}

pub fn parse(markdown: &str) -> ParsedMarkdown {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = BlockBuilder::new(markdown);
    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        builder.event(event, range);
    }
    builder.finish()
}

// =============================================================================
// Block Builder
// =============================================================================

struct BlockBuilder<'a> {
    source: &'a str,
    out: ParsedMarkdown,

    depth: usize,
    /// Range of the top-level block being built
    top_range: Range<usize>,
    /// Blocks produced by the current top-level block
    pending: Vec<Block>,
    taint: Option<FormatError>,

    text: String,
    emphasized_chars: usize,
    plain_chars: usize,
    emphasis_depth: usize,

    heading: Option<u8>,
    in_code: bool,
    lists: Vec<Option<u64>>,
    item_marker: Option<String>,
    table_header: Vec<String>,
    table_rows: Vec<Vec<String>>,
    row: Vec<String>,
    in_image: bool,
}

impl<'a> BlockBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            out: ParsedMarkdown::default(),
            depth: 0,
            top_range: 0..0,
            pending: Vec::new(),
            taint: None,
            text: String::new(),
            emphasized_chars: 0,
            plain_chars: 0,
            emphasis_depth: 0,
            heading: None,
            in_code: false,
            lists: Vec::new(),
            item_marker: None,
            table_header: Vec::new(),
            table_rows: Vec::new(),
            row: Vec::new(),
            in_image: false,
        }
    }

    fn finish(mut self) -> ParsedMarkdown {
        if self.depth > 0 {
            self.close_top_level();
        }
        self.out
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => {
                if self.depth == 0 {
                    self.top_range = range;
                }
                self.depth += 1;
                self.start(tag);
            }
            Event::End(tag) => {
                self.end(tag);
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.close_top_level();
                }
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_text(&code),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.text.push('\n'),
            Event::Rule => {
                if self.depth == 0 {
                    self.out.blocks.push(Block::Rule);
                } else {
                    self.pending.push(Block::Rule);
                }
            }
            Event::InlineHtml(html) if is_line_break(&html) => self.push_text(" "),
            Event::Html(_) | Event::InlineHtml(_) => {
                self.mark(FormatErrorKind::Html, "raw HTML is not rendered");
            }
            Event::TaskListMarker(checked) => {
                self.text.push_str(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.reset_text();
                self.heading = Some(heading_level(level));
            }
            Tag::Paragraph => {
                if self.item_marker.is_none() {
                    self.reset_text();
                } else if !self.text.is_empty() {
                    self.text.push(' ');
                }
            }
            Tag::CodeBlock(_) => {
                // Item text collected so far goes out before the code lines
                self.flush_item();
                self.in_code = true;
                self.reset_text();
            }
            Tag::List(start) => {
                self.flush_item();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_item();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}.", n);
                        *n += 1;
                        marker
                    }
                    _ => "-".to_string(),
                };
                self.item_marker = Some(marker);
            }
            Tag::Table(alignments) => {
                if alignments.len() > MAX_TABLE_COLUMNS {
                    self.mark(
                        FormatErrorKind::TableTooWide,
                        format!(
                            "table has {} columns (max {})",
                            alignments.len(),
                            MAX_TABLE_COLUMNS
                        ),
                    );
                }
                self.table_header.clear();
                self.table_rows.clear();
            }
            Tag::TableHead | Tag::TableRow => self.row.clear(),
            Tag::TableCell => self.reset_text(),
            Tag::Emphasis | Tag::Strong => self.emphasis_depth += 1,
            Tag::Image { .. } => {
                self.in_image = true;
                self.mark(FormatErrorKind::Image, "images are not embedded");
            }
            Tag::HtmlBlock => self.mark(FormatErrorKind::Html, "raw HTML is not rendered"),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                if let Some(level) = self.heading.take() {
                    let text = self.take_text();
                    self.pending.push(Block::Heading { level, text });
                }
            }
            TagEnd::Paragraph => {
                if self.item_marker.is_none() {
                    let italic = self.emphasized_chars > 0 && self.plain_chars == 0;
                    let text = self.take_text();
                    if !text.is_empty() {
                        self.pending.push(Block::Paragraph { text, italic });
                    }
                }
            }
            TagEnd::CodeBlock => {
                if std::mem::take(&mut self.in_code) {
                    let raw = std::mem::take(&mut self.text);
                    let lines = raw.trim_end_matches('\n').lines().map(String::from).collect();
                    self.pending.push(Block::Code { lines });
                    self.reset_text();
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.flush_item();
                self.lists.pop();
            }
            TagEnd::TableCell => {
                let cell = self.take_text();
                self.row.push(cell);
            }
            TagEnd::TableHead => self.table_header = std::mem::take(&mut self.row),
            TagEnd::TableRow => {
                let row = std::mem::take(&mut self.row);
                self.table_rows.push(row);
            }
            TagEnd::Table => {
                let header = std::mem::take(&mut self.table_header);
                let rows = std::mem::take(&mut self.table_rows);
                self.pending.push(Block::Table { header, rows });
            }
            TagEnd::Emphasis | TagEnd::Strong => {
                self.emphasis_depth = self.emphasis_depth.saturating_sub(1)
            }
            TagEnd::Image => self.in_image = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_image {
            return;
        }
        if !self.in_code {
            let visible = text.chars().filter(|c| !c.is_whitespace()).count();
            if self.emphasis_depth > 0 {
                self.emphasized_chars += visible;
            } else {
                self.plain_chars += visible;
            }
        }
        self.text.push_str(text);
    }

    fn flush_item(&mut self) {
        if let Some(marker) = self.item_marker.take() {
            let text = self.take_text();
            if !text.is_empty() {
                self.pending.push(Block::ListItem {
                    depth: self.lists.len().saturating_sub(1),
                    marker,
                    text,
                });
            }
        }
    }

    fn mark(&mut self, kind: FormatErrorKind, message: impl Into<String>) {
        if self.taint.is_none() {
            self.taint = Some(FormatError::new(kind, message));
        }
    }

    fn close_top_level(&mut self) {
        self.flush_item();
        let pending = std::mem::take(&mut self.pending);

        match self.taint.take() {
            Some(err) => {
                let raw = self
                    .source
                    .get(self.top_range.clone())
                    .unwrap_or_default()
                    .trim_end()
                    .to_string();
                self.out.blocks.push(Block::PlainText { text: raw });
                self.out.fallbacks.push(err);
            }
            None => self.out.blocks.extend(pending),
        }

        self.lists.clear();
        self.heading = None;
        self.in_code = false;
        self.in_image = false;
        self.emphasis_depth = 0;
        self.reset_text();
    }

    fn take_text(&mut self) -> String {
        let text = self.text.trim().to_string();
        self.reset_text();
        text
    }

    fn reset_text(&mut self) {
        self.text.clear();
        self.emphasized_chars = 0;
        self.plain_chars = 0;
    }
}

/// `<br>` inside tables is common in model output
fn is_line_break(html: &str) -> bool {
    let tag: String = html.chars().filter(|c| !c.is_whitespace()).collect();
    matches!(tag.to_ascii_lowercase().as_str(), "<br>" | "<br/>")
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_paragraphs_and_rule() {
        let parsed = parse("# Documentation: a.sql\n\n*Generated: 2025-01-01*\n\n---\n\n## 1. Overview\n\nLoads a **member** record.\n");
        assert!(parsed.fallbacks.is_empty());
        assert_eq!(
            parsed.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Documentation: a.sql".into(),
                },
                Block::Paragraph {
                    text: "Generated: 2025-01-01".into(),
                    italic: true,
                },
                Block::Rule,
                Block::Heading {
                    level: 2,
                    text: "1. Overview".into(),
                },
                Block::Paragraph {
                    text: "Loads a member record.".into(),
                    italic: false,
                },
            ]
        );
    }

    #[test]
    fn test_table() {
        let parsed = parse("| Name | Type | Description |\n|---|---|---|\n| `@MemberID` | INT | Member key |\n");
        assert_eq!(
            parsed.blocks,
            vec![Block::Table {
                header: vec!["Name".into(), "Type".into(), "Description".into()],
                rows: vec![vec!["@MemberID".into(), "INT".into(), "Member key".into()]],
            }]
        );
    }

    #[test]
    fn test_lists_nested_and_ordered() {
        let parsed = parse("- one\n- two\n  - inner\n\n1. first\n2. second\n");
        let items: Vec<_> = parsed
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem {
                    depth,
                    marker,
                    text,
                } => Some((*depth, marker.as_str(), text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            items,
            vec![
                (0, "-", "one"),
                (0, "-", "two"),
                (1, "-", "inner"),
                (0, "1.", "first"),
                (0, "2.", "second"),
            ]
        );
    }

    #[test]
    fn test_code_block() {
        let parsed = parse("```sql\nSELECT *\nFROM Members;\n```\n");
        assert_eq!(
            parsed.blocks,
            vec![Block::Code {
                lines: vec!["SELECT *".into(), "FROM Members;".into()],
            }]
        );
    }

    #[test]
    fn test_html_block_falls_back_to_raw_text() {
        let parsed = parse("Intro.\n\n<div align=\"center\">hi</div>\n\nOutro.\n");
        assert_eq!(parsed.fallbacks.len(), 1);
        assert_eq!(parsed.fallbacks[0].kind, FormatErrorKind::Html);
        assert!(parsed.blocks.contains(&Block::PlainText {
            text: "<div align=\"center\">hi</div>".into(),
        }));
        assert_eq!(parsed.blocks.len(), 3);
    }

    #[test]
    fn test_image_falls_back() {
        let parsed = parse("See ![diagram](erd.png) below.\n");
        assert_eq!(parsed.fallbacks[0].kind, FormatErrorKind::Image);
        assert_eq!(
            parsed.blocks,
            vec![Block::PlainText {
                text: "See ![diagram](erd.png) below.".into(),
            }]
        );
    }

    #[test]
    fn test_wide_table_falls_back() {
        let cols = MAX_TABLE_COLUMNS + 1;
        let header = format!("|{}\n", "h|".repeat(cols));
        let sep = format!("|{}\n", "-|".repeat(cols));
        let row = format!("|{}\n", "v|".repeat(cols));
        let parsed = parse(&format!("{}{}{}", header, sep, row));

        assert_eq!(parsed.fallbacks[0].kind, FormatErrorKind::TableTooWide);
        assert!(matches!(parsed.blocks[0], Block::PlainText { .. }));
    }

    #[test]
    fn test_br_in_table_cell_is_not_a_fallback() {
        let parsed = parse("| A | B |\n|---|---|\n| x<br>y | z |\n");
        assert!(parsed.fallbacks.is_empty());
        match &parsed.blocks[0] {
            Block::Table { rows, .. } => assert_eq!(rows[0][0], "x y"),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_block_quote_renders_as_paragraph() {
        let parsed = parse("> Legacy note\n");
        assert_eq!(
            parsed.blocks,
            vec![Block::Paragraph {
                text: "Legacy note".into(),
                italic: false,
            }]
        );
    }

    fn item_texts(parsed: &ParsedMarkdown) -> Vec<&str> {
        parsed
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_loose_list_item_keeps_text_before_code_block() {
        let parsed = parse(
            "1. Add an index on Accounts.MemberID:\n\n   ```sql\n   CREATE INDEX IX_Accounts_MemberID ON Accounts(MemberID);\n   ```\n2. Use SET NOCOUNT ON\n",
        );
        assert!(parsed.fallbacks.is_empty());
        assert_eq!(
            item_texts(&parsed),
            vec!["Add an index on Accounts.MemberID:", "Use SET NOCOUNT ON"]
        );
        let first_item = parsed
            .blocks
            .iter()
            .position(|b| matches!(b, Block::ListItem { marker, .. } if marker == "1."));
        let code = parsed
            .blocks
            .iter()
            .position(|b| matches!(b, Block::Code { .. }));
        assert!(first_item.is_some() && code.is_some());
        assert!(first_item < code);
    }

    #[test]
    fn test_tight_list_item_keeps_text_before_code_block() {
        let parsed = parse("- Step one\n  ```\n  x = 1\n  ```\n");
        assert_eq!(
            parsed.blocks,
            vec![
                Block::ListItem {
                    depth: 0,
                    marker: "-".into(),
                    text: "Step one".into(),
                },
                Block::Code {
                    lines: vec!["x = 1".into()],
                },
            ]
        );
    }
}
