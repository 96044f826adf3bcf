//! Page Layout
//!
//! Places parsed blocks on A4 pages as absolute draw operations. Widths are
//! estimated from the standard Helvetica/Courier metrics, which is close
//! enough for greedy word wrapping. Coordinates are millimetres from the
//! bottom-left corner, ready for the PDF writer.

use crate::constants::pdf::{
    HEADER_TEXT, MARGIN_BOTTOM_MM, MARGIN_LEFT_MM, MARGIN_RIGHT_MM, MARGIN_TOP_MM,
    MAX_CELL_LINES, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, PT_TO_MM,
};

use super::markdown::Block;

// =============================================================================
// Draw Model
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Regular,
    Bold,
    Italic,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

const TITLE: Color = Color::rgb(26, 82, 118);
const SECTION: Color = Color::rgb(40, 116, 166);
const SUBSECTION: Color = Color::rgb(46, 134, 193);
const BODY: Color = Color::rgb(51, 51, 51);
const MUTED: Color = Color::rgb(100, 100, 100);
const RULE: Color = Color::rgb(200, 200, 200);
const GRID: Color = Color::rgb(150, 150, 150);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size_pt: f32,
        font: FontKind,
        color: Color,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        width_pt: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Line { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledDocument {
    pub pages: Vec<Page>,
}

impl StyledDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// =============================================================================
// Text Utilities
// =============================================================================

/// Map text onto Latin-1 for the standard PDF fonts
pub fn sanitize_latin1(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' => out.push('-'),
            '\u{2192}' => out.push_str("->"),
            '\u{00A0}' | '\u{2002}'..='\u{200B}' => out.push(' '),
            '\t' => out.push_str("    "),
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Helvetica advance widths (1/1000 em) for printable ASCII
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

fn char_width_units(c: char, font: FontKind) -> f32 {
    if font == FontKind::Mono {
        return 600.0;
    }
    let base = match c as u32 {
        32..=126 => HELVETICA_WIDTHS[(c as u32 - 32) as usize] as f32,
        _ => 556.0,
    };
    if font == FontKind::Bold { base * 1.06 } else { base }
}

/// Rendered width of `text` in millimetres
pub fn text_width_mm(text: &str, size_pt: f32, font: FontKind) -> f32 {
    let units: f32 = text.chars().map(|c| char_width_units(c, font)).sum();
    units / 1000.0 * size_pt * PT_TO_MM
}

/// Greedy word wrap. Explicit newlines are kept; words wider than the line
/// are split by character.
pub fn wrap(text: &str, max_width_mm: f32, size_pt: f32, font: FontKind) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width_mm(&candidate, size_pt, font) <= max_width_mm {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width_mm(word, size_pt, font) <= max_width_mm {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width_mm(&current, size_pt, font) > max_width_mm {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        lines.push(current);
    }

    // Drop trailing empties from the final split but keep one line minimum
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Code keeps its leading whitespace, so it wraps by character only
fn wrap_code(line: &str, max_width_mm: f32, size_pt: f32) -> Vec<String> {
    let per_line = (max_width_mm / text_width_mm("m", size_pt, FontKind::Mono)).floor() as usize;
    let per_line = per_line.max(1);
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(per_line)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

// =============================================================================
// Paginator
// =============================================================================

struct Style {
    size_pt: f32,
    font: FontKind,
    color: Color,
    line_mm: f32,
}

const PARAGRAPH: Style = Style {
    size_pt: 11.0,
    font: FontKind::Regular,
    color: BODY,
    line_mm: 6.0,
};

const ITALIC_NOTE: Style = Style {
    size_pt: 10.0,
    font: FontKind::Italic,
    color: MUTED,
    line_mm: 6.0,
};

const CODE: Style = Style {
    size_pt: 9.0,
    font: FontKind::Mono,
    color: BODY,
    line_mm: 4.5,
};

const TABLE_TEXT_PT: f32 = 9.0;
const TABLE_LINE_MM: f32 = 4.5;
const CELL_PAD_MM: f32 = 1.5;

fn heading_style(level: u8) -> Style {
    match level {
        1 => Style {
            size_pt: 18.0,
            font: FontKind::Bold,
            color: TITLE,
            line_mm: 10.0,
        },
        2 => Style {
            size_pt: 14.0,
            font: FontKind::Bold,
            color: SECTION,
            line_mm: 8.0,
        },
        _ => Style {
            size_pt: 12.0,
            font: FontKind::Bold,
            color: SUBSECTION,
            line_mm: 7.0,
        },
    }
}

struct Paginator {
    pages: Vec<Page>,
    /// Distance from the top edge to the next free line
    cursor: f32,
}

impl Paginator {
    fn new() -> Self {
        let mut p = Self {
            pages: Vec::new(),
            cursor: MARGIN_TOP_MM,
        };
        p.new_page();
        p
    }

    fn content_width() -> f32 {
        PAGE_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM
    }

    fn bottom_limit() -> f32 {
        PAGE_HEIGHT_MM - MARGIN_BOTTOM_MM
    }

    fn new_page(&mut self) {
        let mut page = Page::default();
        page.ops.push(DrawOp::Text {
            x: MARGIN_LEFT_MM,
            y: PAGE_HEIGHT_MM - 14.0,
            size_pt: 9.0,
            font: FontKind::Italic,
            color: MUTED,
            text: HEADER_TEXT.to_string(),
        });
        page.ops.push(DrawOp::Line {
            from: (MARGIN_LEFT_MM, PAGE_HEIGHT_MM - 18.0),
            to: (PAGE_WIDTH_MM - MARGIN_RIGHT_MM, PAGE_HEIGHT_MM - 18.0),
            color: SECTION,
            width_pt: 0.5,
        });
        self.pages.push(page);
        self.cursor = MARGIN_TOP_MM;
    }

    fn ensure(&mut self, height: f32) {
        let at_top = (self.cursor - MARGIN_TOP_MM).abs() < f32::EPSILON;
        if self.cursor + height > Self::bottom_limit() && !at_top {
            self.new_page();
        }
    }

    fn gap(&mut self, mm: f32) {
        self.cursor += mm;
        if self.cursor > Self::bottom_limit() {
            self.new_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text_line(&mut self, x: f32, text: &str, style: &Style) {
        self.ensure(style.line_mm);
        let baseline = self.cursor + style.line_mm * 0.75;
        self.push(DrawOp::Text {
            x,
            y: PAGE_HEIGHT_MM - baseline,
            size_pt: style.size_pt,
            font: style.font,
            color: style.color,
            text: text.to_string(),
        });
        self.cursor += style.line_mm;
    }

    fn wrapped(&mut self, x: f32, width: f32, text: &str, style: &Style) {
        for line in wrap(text, width, style.size_pt, style.font) {
            self.text_line(x, &line, style);
        }
    }

    fn hline(&mut self, color: Color, width_pt: f32) {
        let y = PAGE_HEIGHT_MM - self.cursor;
        self.push(DrawOp::Line {
            from: (MARGIN_LEFT_MM, y),
            to: (PAGE_WIDTH_MM - MARGIN_RIGHT_MM, y),
            color,
            width_pt,
        });
    }

    fn block(&mut self, block: &Block) {
        let width = Self::content_width();
        match block {
            Block::Heading { level, text } => {
                let style = heading_style(*level);
                let text = sanitize_latin1(text);
                match level {
                    1 => {}
                    2 => self.gap(5.0),
                    _ => self.gap(3.0),
                }
                // Keep a heading with at least one following line
                self.ensure(style.line_mm + PARAGRAPH.line_mm);
                self.wrapped(MARGIN_LEFT_MM, width, &text, &style);
                if *level == 1 {
                    self.gap(2.0);
                    self.hline(TITLE, 0.8);
                    self.gap(5.0);
                } else {
                    self.gap(if *level == 2 { 2.0 } else { 1.0 });
                }
            }
            Block::Paragraph { text, italic } => {
                let style = if *italic { &ITALIC_NOTE } else { &PARAGRAPH };
                self.wrapped(MARGIN_LEFT_MM, width, &sanitize_latin1(text), style);
                self.gap(3.0);
            }
            Block::ListItem {
                depth,
                marker,
                text,
            } => {
                let indent = MARGIN_LEFT_MM + 5.0 * (*depth as f32 + 1.0);
                let marker_width = text_width_mm(marker, PARAGRAPH.size_pt, PARAGRAPH.font) + 2.0;
                let lines = wrap(
                    &sanitize_latin1(text),
                    width - (indent - MARGIN_LEFT_MM) - marker_width,
                    PARAGRAPH.size_pt,
                    PARAGRAPH.font,
                );
                self.ensure(PARAGRAPH.line_mm);
                let baseline = self.cursor + PARAGRAPH.line_mm * 0.75;
                self.push(DrawOp::Text {
                    x: indent,
                    y: PAGE_HEIGHT_MM - baseline,
                    size_pt: PARAGRAPH.size_pt,
                    font: PARAGRAPH.font,
                    color: PARAGRAPH.color,
                    text: marker.clone(),
                });
                for line in lines {
                    self.text_line(indent + marker_width, &line, &PARAGRAPH);
                }
                self.gap(1.0);
            }
            Block::Code { lines } => self.code(lines, 4.0),
            Block::PlainText { text } => {
                let lines: Vec<String> = text.lines().map(String::from).collect();
                self.code(&lines, 0.0);
            }
            Block::Table { header, rows } => self.table(header, rows),
            Block::Rule => {
                self.gap(3.0);
                self.hline(RULE, 0.5);
                self.gap(5.0);
            }
        }
    }

    fn code(&mut self, lines: &[String], indent: f32) {
        let x = MARGIN_LEFT_MM + indent;
        let width = Self::content_width() - indent;
        for line in lines {
            for piece in wrap_code(&sanitize_latin1(line), width, CODE.size_pt) {
                self.text_line(x, &piece, &CODE);
            }
        }
        self.gap(3.0);
    }

    fn table(&mut self, header: &[String], rows: &[Vec<String>]) {
        let columns = header
            .len()
            .max(rows.iter().map(Vec::len).max().unwrap_or(0))
            .max(1);
        let col_width = Self::content_width() / columns as f32;
        let cell_text_width = col_width - 2.0 * CELL_PAD_MM;

        let all_rows = std::iter::once((header, true))
            .chain(rows.iter().map(|r| (r.as_slice(), false)));
        for (row, is_header) in all_rows {
            let font = if is_header { FontKind::Bold } else { FontKind::Regular };
            let cells: Vec<Vec<String>> = (0..columns)
                .map(|i| {
                    let text = row.get(i).map(|s| sanitize_latin1(s)).unwrap_or_default();
                    clip_lines(wrap(&text, cell_text_width, TABLE_TEXT_PT, font))
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = line_count as f32 * TABLE_LINE_MM + 2.0 * CELL_PAD_MM;

            self.ensure(height);
            let top = PAGE_HEIGHT_MM - self.cursor;
            let bottom = top - height;
            let right = MARGIN_LEFT_MM + col_width * columns as f32;

            self.push(DrawOp::Line {
                from: (MARGIN_LEFT_MM, top),
                to: (right, top),
                color: GRID,
                width_pt: 0.4,
            });
            self.push(DrawOp::Line {
                from: (MARGIN_LEFT_MM, bottom),
                to: (right, bottom),
                color: GRID,
                width_pt: 0.4,
            });
            for i in 0..=columns {
                let x = MARGIN_LEFT_MM + col_width * i as f32;
                self.push(DrawOp::Line {
                    from: (x, top),
                    to: (x, bottom),
                    color: GRID,
                    width_pt: 0.4,
                });
            }

            for (i, lines) in cells.iter().enumerate() {
                let x = MARGIN_LEFT_MM + col_width * i as f32 + CELL_PAD_MM;
                for (n, line) in lines.iter().enumerate() {
                    let baseline = self.cursor
                        + CELL_PAD_MM
                        + TABLE_LINE_MM * (n as f32)
                        + TABLE_LINE_MM * 0.75;
                    self.push(DrawOp::Text {
                        x,
                        y: PAGE_HEIGHT_MM - baseline,
                        size_pt: TABLE_TEXT_PT,
                        font,
                        color: BODY,
                        text: line.clone(),
                    });
                }
            }
            self.cursor += height;
        }
        self.gap(4.0);
    }

    fn finish(mut self) -> StyledDocument {
        // Drop a trailing page that only carries the running header
        if self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.ops.len() <= 2) {
            self.pages.pop();
        }

        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {}/{}", i + 1, total);
            let w = text_width_mm(&label, 8.0, FontKind::Italic);
            page.ops.push(DrawOp::Text {
                x: (PAGE_WIDTH_MM - w) / 2.0,
                y: 10.0,
                size_pt: 8.0,
                font: FontKind::Italic,
                color: MUTED,
                text: label,
            });
        }
        StyledDocument { pages: self.pages }
    }
}

fn clip_lines(mut lines: Vec<String>) -> Vec<String> {
    if lines.len() > MAX_CELL_LINES {
        lines.truncate(MAX_CELL_LINES);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}

/// Lay blocks out on pages with running header and "Page n/N" footer
pub fn paginate(blocks: &[Block]) -> StyledDocument {
    let mut paginator = Paginator::new();
    for block in blocks {
        paginator.block(block);
    }
    paginator.finish()
}
