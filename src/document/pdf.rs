//! PDF Writer
//!
//! Serializes a [`StyledDocument`] with `printpdf` using the built-in
//! Helvetica and Courier fonts (no font embedding).

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    Point, Rgb,
};

use super::layout::{Color, DrawOp, FontKind, StyledDocument};
use crate::constants::pdf::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::types::{FormatError, FormatErrorKind};

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, FormatError> {
        Ok(Self {
            regular: builtin(doc, BuiltinFont::Helvetica)?,
            bold: builtin(doc, BuiltinFont::HelveticaBold)?,
            italic: builtin(doc, BuiltinFont::HelveticaOblique)?,
            mono: builtin(doc, BuiltinFont::Courier)?,
        })
    }

    fn get(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Regular => &self.regular,
            FontKind::Bold => &self.bold,
            FontKind::Italic => &self.italic,
            FontKind::Mono => &self.mono,
        }
    }
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, FormatError> {
    doc.add_builtin_font(font)
        .map_err(|e| FormatError::new(FormatErrorKind::Render, format!("font: {}", e)))
}

fn pdf_color(c: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
        None,
    ))
}

/// Render pages to PDF bytes
pub fn render(document: &StyledDocument, title: &str) -> Result<Vec<u8>, FormatError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (index, page) in document.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    size_pt,
                    font,
                    color,
                    text,
                } => {
                    layer.set_fill_color(pdf_color(*color));
                    layer.use_text(text.clone(), *size_pt, Mm(*x), Mm(*y), fonts.get(*font));
                }
                DrawOp::Line {
                    from,
                    to,
                    color,
                    width_pt,
                } => {
                    layer.set_outline_color(pdf_color(*color));
                    layer.set_outline_thickness(*width_pt);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(from.0), Mm(from.1)), false),
                            (Point::new(Mm(to.0), Mm(to.1)), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| FormatError::new(FormatErrorKind::Render, e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| FormatError::new(FormatErrorKind::Render, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::paginate;
    use crate::document::markdown::Block;

    #[test]
    fn test_render_produces_pdf_bytes() {
        let doc = paginate(&[
            Block::Heading {
                level: 1,
                text: "Documentation: calc.py".into(),
            },
            Block::Paragraph {
                text: "Computes interest.".into(),
                italic: false,
            },
        ]);
        let bytes = render(&doc, "calc.py").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_multi_page_document_renders() {
        let blocks: Vec<Block> = (0..120)
            .map(|_| Block::Code {
                lines: vec!["SELECT MemberID FROM Members;".into(); 3],
            })
            .collect();
        let many = paginate(&blocks);
        let one = paginate(&blocks[..1]);
        assert!(many.page_count() > 1);
        assert_eq!(one.page_count(), 1);

        let big = render(&many, "big.sql").unwrap();
        let small = render(&one, "big.sql").unwrap();
        assert!(big.len() > small.len());
    }
}
